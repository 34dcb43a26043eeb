//! Server capabilities and completion status.

/// Status carried by a tagged completion or a greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Server refused the command.
    No,
    /// Command was malformed.
    Bad,
    /// Greeting for a pre-authenticated session.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }

    /// Returns true if the connection cannot be used after this status.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Bye)
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// UIDPLUS extension (RFC 4315), provides `UID EXPUNGE`
    UidPlus,
    /// QUOTA extension (RFC 2087)
    Quota,
    /// ACL extension (RFC 4314)
    Acl,
    /// METADATA extension (RFC 5464)
    Metadata,
    /// METADATA-SERVER extension (RFC 5464)
    MetadataServer,
    /// SORT extension (RFC 5256)
    Sort,
    /// THREAD extension with the named algorithm (RFC 5256)
    Thread(String),
    /// CHILDREN extension (RFC 3348)
    Children,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// SASL-IR initial responses (RFC 4959)
    SaslIr,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability atom.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "UIDPLUS" => Self::UidPlus,
            "QUOTA" => Self::Quota,
            "ACL" => Self::Acl,
            "METADATA" => Self::Metadata,
            "METADATA-SERVER" => Self::MetadataServer,
            "SORT" => Self::Sort,
            "CHILDREN" => Self::Children,
            "SPECIAL-USE" => Self::SpecialUse,
            "LITERAL+" => Self::LiteralPlus,
            "SASL-IR" => Self::SaslIr,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(upper[5..].to_string()),
            _ if upper.starts_with("THREAD=") => Self::Thread(upper[7..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns true if this capability advertises the given SASL mechanism.
    #[must_use]
    pub fn is_auth(&self, mechanism: &str) -> bool {
        matches!(self, Self::Auth(m) if m.eq_ignore_ascii_case(mechanism))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Quota => write!(f, "QUOTA"),
            Self::Acl => write!(f, "ACL"),
            Self::Metadata => write!(f, "METADATA"),
            Self::MetadataServer => write!(f, "METADATA-SERVER"),
            Self::Sort => write!(f, "SORT"),
            Self::Thread(alg) => write!(f, "THREAD={alg}"),
            Self::Children => write!(f, "CHILDREN"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}
