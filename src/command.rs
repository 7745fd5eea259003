use std::fmt::Display;
use tracing::info;
use crate::{evaluate, format_value, FaceSource, RollOutcome};


/// Who gets to see a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollMode {
    /// Announced to the room the command came from.
    Public,
    /// Whispered to the game master, and copied to the moderator channel if one is set.
    GameMaster
}

/// Chat prefixes that start a roll command, matched without regard to case.
pub const TRIGGERS: [(&str, RollMode); 4] = [
    ("!roll ", RollMode::Public),
    ("!r ", RollMode::Public),
    ("!gmroll ", RollMode::GameMaster),
    ("!gmr ", RollMode::GameMaster),
];


/// A recognized roll command, borrowing from the chat line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollRequest<'a> {
    /// Public or game master roll.
    pub mode: RollMode,
    /// The roll query, such as `4d6kh3 + 2`.
    pub query: &'a str,
    /// Free text following the query, possibly empty.
    pub reason: &'a str
}


/// Recognizes a roll command at the start of a chat line.
///
/// # Examples
/// ```
/// use chatroll::{parse_command, RollMode};
///
/// let request = parse_command("!GMR 1d20+5 to sneak").unwrap();
/// assert_eq!(request.mode, RollMode::GameMaster);
/// assert_eq!((request.query, request.reason), ("1d20+5", "to sneak"));
///
/// assert_eq!(parse_command("!rolling 1d20"), None);
/// assert_eq!(parse_command("hello there"), None);
/// ```
pub fn parse_command(chat: &str) -> Option<RollRequest<'_>> {
    TRIGGERS.iter().find_map(|&(trigger, mode)| {
        let prefix = chat.get(..trigger.len())?;
        if !prefix.eq_ignore_ascii_case(trigger) {
            return None;
        }

        let (query, reason) = split_reason(&chat[trigger.len()..]);
        Some(RollRequest { mode, query, reason })
    })
}

/// Splits the text after a trigger into the roll query and the reason for rolling.
///
/// The reason starts after the first space following the last operator, or after
/// the first space at all when there is no operator. Both parts are trimmed.
///
/// # Examples
/// ```
/// use chatroll::split_reason;
///
/// assert_eq!(split_reason("2d6+3 for damage"), ("2d6+3", "for damage"));
/// assert_eq!(split_reason("2d6 + 3 for damage"), ("2d6 +", "3 for damage"));
/// assert_eq!(split_reason("1d20 initiative"), ("1d20", "initiative"));
/// assert_eq!(split_reason("4d6kh3"), ("4d6kh3", ""));
/// ```
pub fn split_reason(text: &str) -> (&str, &str) {
    let text = text.trim();

    let from = text.rfind(['+', '-', '*', '/'])
        .map(|i| i + 1)
        .unwrap_or(0);

    match text[from..].find(' ') {
        Some(space) => {
            let (query, reason) = text.split_at(from + space);
            (query.trim(), reason.trim())
        },
        None => (text, "")
    }
}


/// Settings for who receives game master rolls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RollConfig {
    /// Alias game master rolls are whispered to.
    pub gm: String,
    /// Channel that receives a copy of every game master roll.
    pub moderator_channel: Option<String>,
    /// Whether game master messages carry the numeric result after the trace.
    pub gm_includes_value: bool
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            gm: "GameMaster".into(),
            moderator_channel: None,
            gm_includes_value: true
        }
    }
}


/// Where an outbound message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// The room the command was typed in.
    Room,
    /// A named channel.
    Channel(String)
}

/// A message ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outbound {
    /// Destination.
    pub target: Target,
    /// Message body.
    pub text: String
}

impl Outbound {
    fn room(text: String) -> Self {
        Self { target: Target::Room, text }
    }
}

impl Display for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Target::Room => write!(f, "{}", self.text),
            Target::Channel(channel) => write!(f, "{}: {}", channel, self.text)
        }
    }
}


/// Builds the messages announcing a roll.
///
/// # Examples
/// ```
/// use chatroll::{compose, parse_command, RollConfig, RollOutcome, Target};
///
/// let outcome = RollOutcome { value: 9.0, trace: "[4] [5]".into() };
/// let config = RollConfig { moderator_channel: Some("#mods".into()), ..Default::default() };
///
/// let request = parse_command("!r 2d6 for fun").unwrap();
/// let messages = compose("alice", &request, &outcome, &config);
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].text, "alice just rolled for fun: [4] [5] = 9");
///
/// let request = parse_command("!gmr 2d6 to hide").unwrap();
/// let messages = compose("alice", &request, &outcome, &config);
/// assert_eq!(messages[0].text, "/w GameMaster Game Master, alice just rolled to hide: [4] [5] = 9");
/// assert_eq!(messages[1].target, Target::Channel("#mods".into()));
/// assert_eq!(messages[1].text, "Game Master, alice just rolled to hide: [4] [5] = 9");
/// ```
pub fn compose(user: &str, request: &RollRequest<'_>, outcome: &RollOutcome, config: &RollConfig) -> Vec<Outbound> {
    let rolled = match request.reason {
        "" => format!("{user} just rolled"),
        reason => format!("{user} just rolled {reason}")
    };

    match request.mode {
        RollMode::Public => {
            let text = format!("{rolled}: {} = {}", outcome.trace, format_value(outcome.value));
            vec![Outbound::room(text)]
        },
        RollMode::GameMaster => {
            let value = match config.gm_includes_value {
                true => format_value(outcome.value),
                false => String::new()
            };
            let payload = format!("Game Master, {rolled}: {} = {value}", outcome.trace);

            let mut messages = vec![Outbound::room(format!("/w {} {payload}", config.gm))];
            if let Some(channel) = &config.moderator_channel {
                messages.push(Outbound { target: Target::Channel(channel.clone()), text: payload });
            }

            messages
        }
    }
}

/// Recognizes, evaluates and announces one chat line.
///
/// Returns `None` if the line is not a roll command.
///
/// # Examples
/// ```
/// use chatroll::{handle, RollConfig};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let config = RollConfig::default();
/// let mut rng = StdRng::seed_from_u64(1);
///
/// let messages = handle("!roll 3*4 for the crowd", "bob", &config, &mut rng).unwrap();
/// assert_eq!(messages[0].to_string(), "bob just rolled for the crowd: 3 * 4 = 12");
///
/// assert!(handle("good evening", "bob", &config, &mut rng).is_none());
/// ```
pub fn handle<S: FaceSource + ?Sized>(chat: &str, user: &str, config: &RollConfig, source: &mut S) -> Option<Vec<Outbound>> {
    let request = parse_command(chat)?;
    let outcome = evaluate(request.query, source);

    info!(
        user,
        mode = ?request.mode,
        query = request.query,
        value = outcome.value,
        "handled roll command"
    );

    Some(compose(user, &request, &outcome, config))
}
