//! Fuzz target for standalone prefix, channel and capability parsing

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{Capability, Channel, Prefix, User};
use std::str;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = str::from_utf8(data) else {
        return;
    };

    if let Ok(prefix) = input.parse::<Prefix>() {
        let _ = prefix.to_string().parse::<Prefix>();
    }
    if let Ok(channel) = input.parse::<Channel>() {
        assert_eq!(channel.to_string(), input);
    }
    let _ = input.parse::<Capability>();
    let _ = input.parse::<User>();
});
