//! Parsed mode deltas.
//!
//! A mode change arrives as a flag string plus positional arguments
//! (`+kl secret 10`). Parsing turns that into a sequence of typed
//! `Mode` values (sign + flag + optional argument) that mode application
//! and reply formatting consume uniformly, instead of substring matching
//! on the raw flag string.

use std::fmt;

use crate::error::MessageParseError;

/// Trait for mode flag alphabets ([`UserMode`] and [`ChannelMode`]).
pub trait ModeType: fmt::Display + fmt::Debug + Clone + PartialEq {
    /// Returns true if this flag consumes an argument when set or unset.
    fn takes_arg(&self) -> bool;

    /// Returns true for list-valued flags that may be sent without an
    /// argument to query the list (e.g. `MODE #chan +b`).
    fn is_list_mode(&self) -> bool;

    /// Map a flag character to its typed representation.
    fn from_char(c: char) -> Self;
}

/// User mode flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserMode {
    /// 'i' - invisible
    Invisible,
    /// 'w' - receives WALLOPS
    Wallops,
    /// 'o' - IRC operator
    Oper,
    /// Unrecognized flag character
    Unknown(char),
}

impl ModeType for UserMode {
    fn takes_arg(&self) -> bool {
        false
    }

    fn is_list_mode(&self) -> bool {
        false
    }

    fn from_char(c: char) -> Self {
        match c {
            'i' => Self::Invisible,
            'w' => Self::Wallops,
            'o' => Self::Oper,
            _ => Self::Unknown(c),
        }
    }
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Invisible => 'i',
            Self::Wallops => 'w',
            Self::Oper => 'o',
            Self::Unknown(c) => *c,
        };
        write!(f, "{}", c)
    }
}

/// Channel mode flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// 'b' - ban mask (list mode)
    Ban,
    /// 'k' - channel key
    Key,
    /// 'l' - member limit
    Limit,
    /// 'i' - invite only
    InviteOnly,
    /// 'm' - moderated
    Moderated,
    /// 's' - secret
    Secret,
    /// 't' - topic settable by operators only
    ProtectedTopic,
    /// 'o' - channel operator (membership flag)
    Oper,
    /// 'v' - voice (membership flag)
    Voice,
    /// Unrecognized flag character
    Unknown(char),
}

impl ModeType for ChannelMode {
    fn takes_arg(&self) -> bool {
        matches!(
            self,
            Self::Ban | Self::Key | Self::Limit | Self::Oper | Self::Voice
        )
    }

    fn is_list_mode(&self) -> bool {
        matches!(self, Self::Ban)
    }

    fn from_char(c: char) -> Self {
        match c {
            'b' => Self::Ban,
            'k' => Self::Key,
            'l' => Self::Limit,
            'i' => Self::InviteOnly,
            'm' => Self::Moderated,
            's' => Self::Secret,
            't' => Self::ProtectedTopic,
            'o' => Self::Oper,
            'v' => Self::Voice,
            _ => Self::Unknown(c),
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Ban => 'b',
            Self::Key => 'k',
            Self::Limit => 'l',
            Self::InviteOnly => 'i',
            Self::Moderated => 'm',
            Self::Secret => 's',
            Self::ProtectedTopic => 't',
            Self::Oper => 'o',
            Self::Voice => 'v',
            Self::Unknown(c) => *c,
        };
        write!(f, "{}", c)
    }
}

/// One signed mode change with its optional argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode<T>
where
    T: ModeType,
{
    /// `+flag [arg]`
    Plus(T, Option<String>),
    /// `-flag [arg]`
    Minus(T, Option<String>),
}

impl<T: ModeType> Mode<T> {
    /// The flag regardless of sign.
    pub fn mode(&self) -> &T {
        match self {
            Mode::Plus(m, _) | Mode::Minus(m, _) => m,
        }
    }

    /// The argument regardless of sign.
    pub fn arg(&self) -> Option<&str> {
        match self {
            Mode::Plus(_, a) | Mode::Minus(_, a) => a.as_deref(),
        }
    }

    /// Returns true for `+` changes.
    pub fn is_plus(&self) -> bool {
        matches!(self, Mode::Plus(_, _))
    }
}

impl Mode<UserMode> {
    /// Parse user mode pieces like `["+iw"]`.
    pub fn as_user_modes(pieces: &[&str]) -> Result<Vec<Mode<UserMode>>, MessageParseError> {
        parse_modes(pieces)
    }
}

impl Mode<ChannelMode> {
    /// Parse channel mode pieces like `["+kl", "secret", "10"]`.
    pub fn as_channel_modes(pieces: &[&str]) -> Result<Vec<Mode<ChannelMode>>, MessageParseError> {
        parse_modes(pieces)
    }
}

fn parse_modes<T>(pieces: &[&str]) -> Result<Vec<Mode<T>>, MessageParseError>
where
    T: ModeType,
{
    let mut res = vec![];

    let Some((first, rest)) = pieces.split_first() else {
        return Ok(res);
    };

    let mut args = rest.iter().copied().peekable();
    // A missing leading sign means `+`, matching common ircd behavior.
    let mut plus = !first.starts_with('-');

    for c in first.chars() {
        match c {
            '+' => plus = true,
            '-' => plus = false,
            _ => {
                let mode = T::from_char(c);
                let arg = if mode.takes_arg() {
                    match args.next() {
                        Some(arg) => Some(arg.to_string()),
                        // List modes may be queried without an argument.
                        None if mode.is_list_mode() => None,
                        None => {
                            return Err(MessageParseError::InvalidModeArg(format!(
                                "mode '{}' requires an argument",
                                c
                            )));
                        }
                    }
                } else {
                    None
                };
                res.push(if plus {
                    Mode::Plus(mode, arg)
                } else {
                    Mode::Minus(mode, arg)
                });
            }
        }
    }

    if args.peek().is_some() {
        return Err(MessageParseError::InvalidModeArg(
            "unused arguments after mode flags".to_string(),
        ));
    }

    Ok(res)
}

/// Format a mode delta back into wire parameters: one signed flag run
/// followed by the arguments in flag order.
pub fn format_modes<T: ModeType>(modes: &[Mode<T>]) -> Vec<String> {
    let mut flags = String::new();
    let mut args = Vec::new();
    let mut sign: Option<bool> = None;

    for m in modes {
        let plus = m.is_plus();
        if sign != Some(plus) {
            flags.push(if plus { '+' } else { '-' });
            sign = Some(plus);
        }
        flags.push_str(&m.mode().to_string());
        if let Some(a) = m.arg() {
            args.push(a.to_string());
        }
    }

    let mut out = vec![flags];
    out.extend(args);
    out
}
