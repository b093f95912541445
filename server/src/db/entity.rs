/// A relay endpoint: either a game server or a Discord channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum EntityType {
    Server = 0,
    Channel = 1,
    /// Directory-query wildcard. Never the type of a stored entity.
    All = 2,
}

impl EntityType {
    /// The routing-complementary type: servers deliver to channels and
    /// channels deliver to servers. Involutive for the stored types.
    pub fn polarize(self) -> EntityType {
        match self {
            EntityType::Server => EntityType::Channel,
            EntityType::Channel => EntityType::Server,
            EntityType::All => EntityType::All,
        }
    }

    pub fn from_i64(v: i64) -> Option<EntityType> {
        match v {
            0 => Some(EntityType::Server),
            1 => Some(EntityType::Channel),
            2 => Some(EntityType::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Server => write!(f, "Server"),
            EntityType::Channel => write!(f, "Channel"),
            EntityType::All => write!(f, "All"),
        }
    }
}

/// A directory record. The storage layer is the single source of truth;
/// these values are read fresh for every routing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub entity_type: EntityType,
    pub receive_channels: Vec<i64>,
    pub send_channels: Vec<i64>,
    pub created_at: String,
}

impl Entity {
    /// Whether this entity receives relay on any of the given send channels.
    pub fn receives_from(&self, send_channels: &[i64]) -> bool {
        self.receive_channels
            .iter()
            .any(|c| send_channels.contains(c))
    }
}

#[derive(Debug, PartialEq)]
pub struct ChannelParseError {
    pub token: String,
}

impl std::fmt::Display for ChannelParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid channel number: {:?}", self.token)
    }
}

impl std::error::Error for ChannelParseError {}

/// Parse a comma-joined channel list, ignoring embedded whitespace.
///
/// A non-numeric token rejects the whole list. (The system this replaces
/// silently coerced bad tokens to zero; since the directory only stores
/// strings produced by `encode_channels`, rejection only ever fires on bad
/// operator input, where loud is better.)
pub fn parse_channels(s: &str) -> Result<Vec<i64>, ChannelParseError> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(Vec::new());
    }

    compact
        .split(',')
        .map(|token| {
            token.parse::<i64>().map_err(|_| ChannelParseError {
                token: token.to_string(),
            })
        })
        .collect()
}

/// Canonical storage form: comma-joined decimals.
pub fn encode_channels(channels: &[i64]) -> String {
    channels
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Human-facing form: ", "-joined, with the empty set shown as "None".
pub fn channel_string(channels: &[i64]) -> String {
    if channels.is_empty() {
        return "None".to_string();
    }
    channels
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
