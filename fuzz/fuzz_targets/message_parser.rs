//! Fuzz target for line parsing and command classification
//!
//! Every input must come back as a command, valid or not, and a valid
//! command's canonical form must classify to the same variant again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{batch, Command, ParseErrorPolicy};
use std::mem::discriminant;
use std::str;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = str::from_utf8(data) else {
        return;
    };
    if input.len() > 8191 {
        return;
    }

    let command = Command::from_line(input);
    if let Some(message) = command.to_message() {
        let again = Command::from_line(&message.to_string());
        assert_eq!(discriminant(&command), discriminant(&again), "{:?}", input);
    }

    let _ = batch::parse_batch(input, ParseErrorPolicy::Propagate);
});
