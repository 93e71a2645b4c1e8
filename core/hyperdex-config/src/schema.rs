use hyperdex_datatype::DataType;
use hyperdex_ids::SpaceId;

/// One named, typed attribute of a space. `attrs[0]` of a [`Space`] is
/// always the key attribute (spec §3: subspace 0 holds exactly the key
/// dimension).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: DataType,
}

/// A space: an identifier, a name, and its ordered list of attributes
/// (spec §4.E). The admin CLI / space-definition parser that would
/// normally assign names and types is out of scope, so the configuration
/// line grammar carries both directly (spec §6 `space` record, extended
/// with `name:type` tokens).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Space {
    pub fn key_attr(&self) -> &Attribute {
        &self.attrs[0]
    }

    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|a| a.name == name)
    }

    pub fn attr_kinds(&self) -> Vec<DataType> {
        self.attrs.iter().map(|a| a.kind).collect()
    }
}

/// A subspace: a subset of a space's attributes selected by a boolean
/// mask, one per attribute (spec §3, §4.E). Subspace 0's mask always
/// selects exactly the key attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subspace {
    pub space: SpaceId,
    pub number: u16,
    /// `mask.len() == space.attrs.len()`; `mask[i]` is true iff attribute
    /// `i` of the space is one of this subspace's dimensions.
    pub mask: Vec<bool>,
}

impl Subspace {
    /// Indices into the owning space's `attrs`, in ascending order — the
    /// shape `hyperdex_hash::secondary_hash` expects for its `mask`
    /// argument.
    pub fn attr_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &selected)| selected.then_some(i))
            .collect()
    }

    pub fn is_key_subspace(&self) -> bool {
        self.number == 0
    }
}
