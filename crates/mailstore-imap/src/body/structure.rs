//! BODYSTRUCTURE tree.

use crate::parser::Envelope;

/// Fields shared by every non-multipart part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyFields {
    /// Content-Type parameters, names upper-cased.
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding, upper-cased.
    pub encoding: String,
    /// Size in octets.
    pub size: u32,
}

/// One node of a message's MIME tree as reported by the server.
///
/// Media types and subtypes are upper-cased by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyStructure {
    /// Leaf part.
    Single {
        /// Media type, e.g. `TEXT`.
        media_type: String,
        /// Media subtype, e.g. `HTML`.
        media_subtype: String,
        /// Common fields.
        fields: BodyFields,
        /// Line count, present for `TEXT/*`.
        lines: Option<u32>,
    },
    /// `MESSAGE/RFC822` part wrapping exactly one nested body.
    Message {
        /// Common fields of the wrapper part.
        fields: BodyFields,
        /// Envelope of the nested message.
        envelope: Box<Envelope>,
        /// Body of the nested message.
        body: Box<Self>,
        /// Line count.
        lines: u32,
    },
    /// `MULTIPART/*` container.
    Multipart {
        /// Subtype, e.g. `MIXED`.
        subtype: String,
        /// Extension parameters (`boundary`, `type`, ...).
        params: Vec<(String, String)>,
        /// Children in order.
        parts: Vec<Self>,
    },
}

impl BodyStructure {
    /// Media type of this node.
    #[must_use]
    pub fn media_type(&self) -> &str {
        match self {
            Self::Single { media_type, .. } => media_type,
            Self::Message { .. } => "MESSAGE",
            Self::Multipart { .. } => "MULTIPART",
        }
    }

    /// Media subtype of this node.
    #[must_use]
    pub fn media_subtype(&self) -> &str {
        match self {
            Self::Single { media_subtype, .. } => media_subtype,
            Self::Message { .. } => "RFC822",
            Self::Multipart { subtype, .. } => subtype,
        }
    }

    /// Returns true if type and subtype match, case-insensitively.
    #[must_use]
    pub fn is(&self, media_type: &str, media_subtype: &str) -> bool {
        self.media_type().eq_ignore_ascii_case(media_type)
            && self.media_subtype().eq_ignore_ascii_case(media_subtype)
    }

    /// Content-Type parameters of this node.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        match self {
            Self::Single { fields, .. } | Self::Message { fields, .. } => &fields.params,
            Self::Multipart { params, .. } => params,
        }
    }

    /// Looks up a parameter by name, case-insensitively.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Content-ID of a leaf or message part.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        match self {
            Self::Single { fields, .. } | Self::Message { fields, .. } => fields.id.as_deref(),
            Self::Multipart { .. } => None,
        }
    }

    /// Size in octets; multiparts report the sum of their children.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Single { fields, .. } | Self::Message { fields, .. } => u64::from(fields.size),
            Self::Multipart { parts, .. } => parts.iter().map(Self::size).sum(),
        }
    }

    /// Returns true for `MULTIPART/*`.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(media_type: &str, subtype: &str, params: &[(&str, &str)]) -> BodyStructure {
        BodyStructure::Single {
            media_type: media_type.to_string(),
            media_subtype: subtype.to_string(),
            fields: BodyFields {
                params: params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                size: 10,
                ..BodyFields::default()
            },
            lines: None,
        }
    }

    #[test]
    fn type_checks_ignore_case() {
        let part = leaf("TEXT", "HTML", &[]);
        assert!(part.is("text", "html"));
        assert!(!part.is("text", "plain"));
    }

    #[test]
    fn param_lookup_ignores_case() {
        let part = leaf("APPLICATION", "PKCS7-MIME", &[("SMIME-TYPE", "signed-data")]);
        assert_eq!(part.param("smime-type"), Some("signed-data"));
        assert_eq!(part.param("name"), None);
    }

    #[test]
    fn multipart_size_sums_children() {
        let multi = BodyStructure::Multipart {
            subtype: "MIXED".to_string(),
            params: Vec::new(),
            parts: vec![leaf("TEXT", "PLAIN", &[]), leaf("IMAGE", "PNG", &[])],
        };
        assert_eq!(multi.size(), 20);
        assert_eq!(multi.media_type(), "MULTIPART");
        assert!(multi.content_id().is_none());
    }
}
