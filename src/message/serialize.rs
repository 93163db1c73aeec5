use std::fmt::{self, Display, Formatter};

use super::types::Message;

impl Display for Message {
    /// Tag values are written as stored, which is already the escaped form.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            write!(f, "@")?;

            for (i, (key, value)) in self.tags.iter().enumerate() {
                if i > 0 {
                    write!(f, ";")?;
                }

                write!(f, "{}", key)?;

                if let Some(value) = value {
                    write!(f, "={}", value)?;
                }
            }

            write!(f, " ")?;
        }

        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        f.write_str(&self.verb)?;

        for param in &self.params {
            write!(f, " {}", param)?;
        }

        if let Some(ref trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}
