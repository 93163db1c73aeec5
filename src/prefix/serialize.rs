use std::fmt;

use super::types::Prefix;

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prefix::Server { name } => f.write_str(name),
            Prefix::Nickname { nick, user, host } => {
                f.write_str(nick)?;
                // A user part is only meaningful together with a host.
                if let Some(host) = host {
                    if let Some(user) = user {
                        write!(f, "!{}", user)?;
                    }
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}
