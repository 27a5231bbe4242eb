//! Channel name helpers.

/// Maximum length of a channel name.
pub const CHANNEL_MAX_LEN: usize = 50;

/// Extension trait for checking whether a string names a channel.
pub trait ChannelExt {
    /// Returns true if this string is a syntactically valid channel name.
    ///
    /// Channels start with `#` and contain no spaces, commas, BEL or NUL.
    fn is_channel_name(&self) -> bool;
}

impl<T: AsRef<str>> ChannelExt for T {
    fn is_channel_name(&self) -> bool {
        let name = self.as_ref();
        if name.len() < 2 || name.len() > CHANNEL_MAX_LEN {
            return false;
        }
        if !name.starts_with('#') {
            return false;
        }
        name.chars()
            .skip(1)
            .all(|c| c.is_ascii() && !matches!(c, ' ' | ',' | '\x07' | '\0'))
    }
}
