//! Section paths and part lookup over a [`BodyStructure`] snapshot.
//!
//! Numbering follows RFC 3501 section 6.4.5: children of a multipart are
//! numbered from 1 under the multipart's own path, a `MESSAGE/RFC822` part
//! hands its own path to the body it wraps, and a non-multipart message body
//! is part `1`.

use super::BodyStructure;

/// Dotted-decimal part coordinate such as `2.1.3`.
///
/// The empty path names the top-level multipart itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SectionPath(String);

impl SectionPath {
    /// Path of the top-level node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `1.2.3`; rejects empty or zero components.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s.split('.')
                .all(|part| part.parse::<u32>().is_ok_and(|n| n > 0) && !part.starts_with('+'));
        valid.then(|| Self(s.to_string()))
    }

    /// Path of the `index`-th (1-based) child of a multipart at this path.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        if self.0.is_empty() {
            Self(index.to_string())
        } else {
            Self(format!("{}.{index}", self.0))
        }
    }

    /// Returns the path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the top-level multipart.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What [`locate`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartTarget<'a> {
    /// A section path such as `2.2`.
    Section(&'a str),
    /// A Content-ID, with or without angle brackets.
    ContentId(&'a str),
}

/// Finds the first node matching `target` in depth-first order.
///
/// Content-ID targets only match leaf parts.
#[must_use]
pub fn locate<'a>(
    root: &'a BodyStructure,
    target: PartTarget<'_>,
) -> Option<(&'a BodyStructure, SectionPath)> {
    let wanted_id = match target {
        PartTarget::ContentId(id) => Some(normalize_content_id(id)),
        PartTarget::Section(_) => None,
    };
    locate_at(root, target, wanted_id, root_path(root))
}

fn root_path(root: &BodyStructure) -> SectionPath {
    if root.is_multipart() {
        SectionPath::root()
    } else {
        SectionPath("1".to_string())
    }
}

fn locate_at<'a>(
    node: &'a BodyStructure,
    target: PartTarget<'_>,
    wanted_id: Option<&str>,
    path: SectionPath,
) -> Option<(&'a BodyStructure, SectionPath)> {
    let hit = match (target, node) {
        (PartTarget::Section(section), _) => path.as_str() == section,
        (PartTarget::ContentId(_), BodyStructure::Single { .. }) => node
            .content_id()
            .is_some_and(|id| Some(normalize_content_id(id)) == wanted_id),
        (PartTarget::ContentId(_), _) => false,
    };
    if hit {
        return Some((node, path));
    }

    match node {
        BodyStructure::Single { .. } => None,
        BodyStructure::Message { body, .. } => locate_at(body, target, wanted_id, path),
        BodyStructure::Multipart { parts, .. } => parts
            .iter()
            .enumerate()
            .find_map(|(i, part)| locate_at(part, target, wanted_id, path.child(i + 1))),
    }
}

/// Strips whitespace and enclosing angle brackets from a Content-ID.
#[must_use]
pub fn normalize_content_id(id: &str) -> &str {
    let id = id.trim();
    let id = id.strip_prefix('<').unwrap_or(id);
    id.strip_suffix('>').unwrap_or(id)
}

/// Returns true if the tree holds a part a body renderer should skip:
/// S/MIME signed-data, `multipart/signed`, or a SMIL `multipart/related`.
///
/// Multiparts of any other subtype are searched child by child; the first
/// ignorable descendant decides.
#[must_use]
pub fn ignorable(node: &BodyStructure) -> bool {
    match node {
        BodyStructure::Single { .. } => is_smime_signed_data(node),
        BodyStructure::Message { .. } => false,
        BodyStructure::Multipart { subtype, parts, .. } => {
            if subtype.eq_ignore_ascii_case("SIGNED") {
                return true;
            }
            if subtype.eq_ignore_ascii_case("RELATED")
                && node
                    .param("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("application/smil"))
            {
                return true;
            }
            parts.iter().any(ignorable)
        }
    }
}

fn is_smime_signed_data(node: &BodyStructure) -> bool {
    let pkcs7 = node.is("APPLICATION", "PKCS7-MIME") || node.is("APPLICATION", "X-PKCS7-MIME");
    pkcs7
        && (node
            .param("smime-type")
            .is_some_and(|t| t.eq_ignore_ascii_case("signed-data"))
            || node
                .param("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("smime.p7m")))
}

impl BodyStructure {
    /// Lists every node with its section path, depth-first.
    #[must_use]
    pub fn walk(&self) -> Vec<(&Self, SectionPath)> {
        fn visit<'a>(
            node: &'a BodyStructure,
            path: SectionPath,
            out: &mut Vec<(&'a BodyStructure, SectionPath)>,
        ) {
            out.push((node, path.clone()));
            match node {
                BodyStructure::Single { .. } => {}
                BodyStructure::Message { body, .. } => visit(body, path, out),
                BodyStructure::Multipart { parts, .. } => {
                    for (i, part) in parts.iter().enumerate() {
                        visit(part, path.child(i + 1), out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        visit(self, root_path(self), &mut out);
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::BodyFields;
    use crate::parser::Envelope;

    fn leaf(media_type: &str, subtype: &str) -> BodyStructure {
        leaf_with(media_type, subtype, None, &[])
    }

    fn leaf_with(
        media_type: &str,
        subtype: &str,
        id: Option<&str>,
        params: &[(&str, &str)],
    ) -> BodyStructure {
        BodyStructure::Single {
            media_type: media_type.to_string(),
            media_subtype: subtype.to_string(),
            fields: BodyFields {
                params: params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                id: id.map(str::to_string),
                encoding: "7BIT".to_string(),
                ..BodyFields::default()
            },
            lines: None,
        }
    }

    fn multi(subtype: &str, params: &[(&str, &str)], parts: Vec<BodyStructure>) -> BodyStructure {
        BodyStructure::Multipart {
            subtype: subtype.to_string(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            parts,
        }
    }

    fn message(body: BodyStructure) -> BodyStructure {
        BodyStructure::Message {
            fields: BodyFields::default(),
            envelope: Box::new(Envelope::default()),
            body: Box::new(body),
            lines: 0,
        }
    }

    fn mixed_alternative() -> BodyStructure {
        multi(
            "MIXED",
            &[],
            vec![
                leaf("TEXT", "PLAIN"),
                multi(
                    "ALTERNATIVE",
                    &[],
                    vec![leaf("TEXT", "PLAIN"), leaf("TEXT", "HTML")],
                ),
            ],
        )
    }

    #[test]
    fn finds_nested_alternative_leaf() {
        let tree = mixed_alternative();
        let (node, path) = locate(&tree, PartTarget::Section("2.2")).unwrap();
        assert!(node.is("TEXT", "HTML"));
        assert_eq!(path.as_str(), "2.2");
    }

    #[test]
    fn multipart_itself_is_addressable() {
        let tree = mixed_alternative();
        let (node, _) = locate(&tree, PartTarget::Section("2")).unwrap();
        assert!(node.is("MULTIPART", "ALTERNATIVE"));
        assert!(locate(&tree, PartTarget::Section("3")).is_none());
    }

    #[test]
    fn single_part_message_is_part_one() {
        let tree = leaf("TEXT", "PLAIN");
        let (node, path) = locate(&tree, PartTarget::Section("1")).unwrap();
        assert_eq!(node, &tree);
        assert_eq!(path.as_str(), "1");
    }

    #[test]
    fn nested_message_passes_its_own_path_down() {
        let forwarded = multi("MIXED", &[], vec![leaf("TEXT", "PLAIN"), leaf("IMAGE", "GIF")]);
        let tree = multi("MIXED", &[], vec![leaf("TEXT", "PLAIN"), message(forwarded)]);

        let (wrapper, _) = locate(&tree, PartTarget::Section("2")).unwrap();
        assert!(wrapper.is("MESSAGE", "RFC822"));
        let (gif, _) = locate(&tree, PartTarget::Section("2.2")).unwrap();
        assert!(gif.is("IMAGE", "GIF"));
    }

    #[test]
    fn content_id_ignores_angle_brackets() {
        let tree = multi(
            "RELATED",
            &[],
            vec![
                leaf("TEXT", "HTML"),
                leaf_with("IMAGE", "PNG", Some("<logo@example.org>"), &[]),
                leaf_with("IMAGE", "PNG", Some("logo@example.org"), &[]),
            ],
        );
        let (_, path) = locate(&tree, PartTarget::ContentId("logo@example.org")).unwrap();
        assert_eq!(path.as_str(), "2");
        let (_, path) = locate(&tree, PartTarget::ContentId("<logo@example.org>")).unwrap();
        assert_eq!(path.as_str(), "2");
        assert!(locate(&tree, PartTarget::ContentId("missing@example.org")).is_none());
    }

    #[test]
    fn walk_paths_are_unique() {
        let tree = multi("MIXED", &[], vec![mixed_alternative(), leaf("IMAGE", "PNG")]);
        let paths: Vec<String> = tree
            .walk()
            .into_iter()
            .map(|(_, p)| p.to_string())
            .collect();
        assert_eq!(paths, vec!["", "1", "1.1", "1.2", "1.2.1", "1.2.2", "2"]);
    }

    #[test]
    fn section_path_parse() {
        assert!(SectionPath::parse("2.1.3").is_some());
        assert!(SectionPath::parse("").is_none());
        assert!(SectionPath::parse("2.0").is_none());
        assert!(SectionPath::parse("2.x").is_none());
        assert_eq!(SectionPath::root().child(2).child(1).as_str(), "2.1");
    }

    #[test]
    fn ignorable_parts() {
        let p7m = leaf_with(
            "APPLICATION",
            "PKCS7-MIME",
            None,
            &[("smime-type", "signed-data"), ("name", "smime.p7m")],
        );
        assert!(ignorable(&p7m));

        let encrypted = leaf_with(
            "APPLICATION",
            "PKCS7-MIME",
            None,
            &[("smime-type", "enveloped-data")],
        );
        assert!(!ignorable(&encrypted));

        assert!(ignorable(&multi("SIGNED", &[], vec![leaf("TEXT", "PLAIN")])));
        assert!(ignorable(&multi(
            "RELATED",
            &[("TYPE", "application/smil")],
            vec![leaf("APPLICATION", "SMIL")]
        )));
        assert!(!ignorable(&multi(
            "RELATED",
            &[("TYPE", "text/html")],
            vec![leaf("TEXT", "HTML")]
        )));
    }

    #[test]
    fn ignorable_searches_children() {
        let tree = multi(
            "MIXED",
            &[],
            vec![leaf("TEXT", "PLAIN"), multi("SIGNED", &[], vec![leaf("TEXT", "PLAIN")])],
        );
        assert!(ignorable(&tree));
        assert!(!ignorable(&mixed_alternative()));
        assert!(!ignorable(&message(multi("SIGNED", &[], Vec::new()))));
    }
}
