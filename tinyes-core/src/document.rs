use serde::{Deserialize, Serialize};

/// Separator joining `Field` and `Word` into the canonical posting-list
/// key. Chosen to be a control byte that cannot appear in realistic
/// field/word text, so the canonical form stays injective.
const CANONICAL_SEPARATOR: char = '\u{1}';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    pub field: String,
    pub word: String,
}

impl Keyword {
    pub fn new(field: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            word: word.into(),
        }
    }

    /// Reproducible string form used as the posting-list key.
    pub fn canonical(&self) -> String {
        let mut s = String::with_capacity(self.field.len() + self.word.len() + 1);
        s.push_str(&self.field);
        s.push(CANONICAL_SEPARATOR);
        s.push_str(&self.word);
        s
    }
}

impl From<tinyes_proto::pb::Keyword> for Keyword {
    fn from(k: tinyes_proto::pb::Keyword) -> Self {
        Keyword::new(k.field, k.word)
    }
}

impl From<Keyword> for tinyes_proto::pb::Keyword {
    fn from(k: Keyword) -> Self {
        tinyes_proto::pb::Keyword {
            field: k.field,
            word: k.word,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermQuery {
    Leaf(Keyword),
    Must(Vec<TermQuery>),
    Should(Vec<TermQuery>),
    Empty,
}

impl TermQuery {
    pub fn leaf(field: impl Into<String>, word: impl Into<String>) -> Self {
        TermQuery::Leaf(Keyword::new(field, word))
    }

    pub fn empty() -> Self {
        TermQuery::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TermQuery::Empty)
    }

    /// Returns a new query whose must-children are the non-empty union
    /// of `self` and `others`. Passing no extras returns `self`
    /// unchanged; if every operand is empty the result is the empty
    /// query.
    pub fn and(&self, others: &[TermQuery]) -> TermQuery {
        if others.is_empty() {
            return self.clone();
        }
        combine(self, others, TermQuery::Must)
    }

    /// Same as [`TermQuery::and`] but ORs the operands together.
    pub fn or(&self, others: &[TermQuery]) -> TermQuery {
        if others.is_empty() {
            return self.clone();
        }
        combine(self, others, TermQuery::Should)
    }

    /// Debugging/test-oracle rendering: leaf -> canonical string,
    /// single-child must/should unwraps, multi-child renders as
    /// `(a&b&c)` / `(a|b|c)`.
    pub fn render(&self) -> String {
        match self {
            TermQuery::Empty => String::new(),
            TermQuery::Leaf(kw) => kw.canonical(),
            TermQuery::Must(children) => join_rendered(children, '&'),
            TermQuery::Should(children) => join_rendered(children, '|'),
        }
    }
}

fn combine(
    base: &TermQuery,
    others: &[TermQuery],
    wrap: impl FnOnce(Vec<TermQuery>) -> TermQuery,
) -> TermQuery {
    let mut children = Vec::with_capacity(1 + others.len());
    if !base.is_empty() {
        children.push(base.clone());
    }
    for other in others {
        if !other.is_empty() {
            children.push(other.clone());
        }
    }
    if children.is_empty() {
        TermQuery::Empty
    } else {
        wrap(children)
    }
}

fn join_rendered(children: &[TermQuery], sep: char) -> String {
    if children.len() == 1 {
        return children[0].render();
    }
    let mut out = String::from("(");
    for child in children {
        let s = child.render();
        if !s.is_empty() {
            out.push_str(&s);
            out.push(sep);
        }
    }
    if out.len() > 1 {
        out.pop();
    }
    out.push(')');
    out
}

impl From<tinyes_proto::pb::TermQuery> for TermQuery {
    fn from(q: tinyes_proto::pb::TermQuery) -> Self {
        use tinyes_proto::pb::term_query::Node;
        match q.node {
            None => TermQuery::Empty,
            Some(Node::Leaf(kw)) => TermQuery::Leaf(kw.into()),
            Some(Node::Must(list)) => {
                TermQuery::Must(list.items.into_iter().map(Into::into).collect())
            }
            Some(Node::Should(list)) => {
                TermQuery::Should(list.items.into_iter().map(Into::into).collect())
            }
        }
    }
}

impl From<TermQuery> for tinyes_proto::pb::TermQuery {
    fn from(q: TermQuery) -> Self {
        use tinyes_proto::pb::{term_query::Node, TermQueryList};
        let node = match q {
            TermQuery::Empty => None,
            TermQuery::Leaf(kw) => Some(Node::Leaf(kw.into())),
            TermQuery::Must(children) => Some(Node::Must(TermQueryList {
                items: children.into_iter().map(Into::into).collect(),
            })),
            TermQuery::Should(children) => Some(Node::Should(TermQueryList {
                items: children.into_iter().map(Into::into).collect(),
            })),
        };
        tinyes_proto::pb::TermQuery { node }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub int_id: u64,
    pub bits_feature: u64,
    pub keywords: Vec<Keyword>,
    #[serde(with = "bytes_as_vec")]
    pub bytes: bytes::Bytes,
}

impl Document {
    pub fn new(id: impl Into<String>, bits_feature: u64, keywords: Vec<Keyword>, bytes: bytes::Bytes) -> Self {
        Self {
            id: id.into(),
            int_id: 0,
            bits_feature,
            keywords,
            bytes,
        }
    }
}

impl From<tinyes_proto::pb::Document> for Document {
    fn from(d: tinyes_proto::pb::Document) -> Self {
        Document {
            id: d.id,
            int_id: d.int_id,
            bits_feature: d.bits_feature,
            keywords: d.keywords.into_iter().map(Into::into).collect(),
            bytes: bytes::Bytes::from(d.bytes),
        }
    }
}

impl From<Document> for tinyes_proto::pb::Document {
    fn from(d: Document) -> Self {
        tinyes_proto::pb::Document {
            id: d.id,
            int_id: d.int_id,
            bits_feature: d.bits_feature,
            keywords: d.keywords.into_iter().map(Into::into).collect(),
            bytes: d.bytes.to_vec(),
        }
    }
}

mod bytes_as_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &bytes::Bytes, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<bytes::Bytes, D::Error> {
        let v: Vec<u8> = Vec::deserialize(de)?;
        Ok(bytes::Bytes::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_injective_enough_for_tests() {
        let a = Keyword::new("content", "word");
        let b = Keyword::new("cont", "entword");
        assert_ne!(a.canonical(), b.canonical());
    }

    #[test]
    fn and_or_identity_laws() {
        let q = TermQuery::leaf("f", "w");
        assert_eq!(q.and(&[]), q);
        assert_eq!(q.or(&[]), q);
        assert_eq!(TermQuery::empty().and(&[q.clone()]), TermQuery::Must(vec![q.clone()]));
        assert_eq!(q.and(&[TermQuery::empty()]), TermQuery::Must(vec![q.clone()]));
    }

    #[test]
    fn and_of_all_empty_is_empty() {
        assert_eq!(TermQuery::empty().and(&[TermQuery::empty()]), TermQuery::Empty);
    }

    #[test]
    fn render_matches_oracle_shape() {
        let a = TermQuery::leaf("", "A");
        let b = TermQuery::leaf("", "B");
        let c = TermQuery::leaf("", "C");
        // Or() nests rather than flattens, matching the upstream semantics.
        let q = a.or(&[b]).or(&[c]);
        let ka = Keyword::new("", "A").canonical();
        let kb = Keyword::new("", "B").canonical();
        let kc = Keyword::new("", "C").canonical();
        assert_eq!(q.render(), format!("(({}|{})|{})", ka, kb, kc));
    }
}
