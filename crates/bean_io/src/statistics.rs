use derive_more::{Add, AddAssign, Display, From, Into};

/// A newtype for `usize` used to count the number of bytes written.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, PartialOrd, Ord, Add, AddAssign, From, Into)]
pub struct Bytes(usize);

/// A newtype for `usize` used to count the number of instances of some item.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, PartialOrd, Ord, Add, AddAssign, From, Into)]
pub struct Instances(usize);

/// What an encode call wrote.
///
/// Statistics of several calls may be summed.
#[derive(Clone, Debug, Default, PartialEq, Add, AddAssign)]
pub struct Statistics {
    pub nodes: Instances,
    pub node_bytes: Bytes,
    pub literal_bytes: Bytes,

    /// References to literals, per tier.
    pub global_references: Instances,
    pub predefined_references: Instances,
    pub pooled_references: Instances,

    /// Distinct program-specific literals.
    pub pooled_literals: Instances,
}
impl Statistics {
    pub fn total_bytes(&self) -> Bytes {
        self.node_bytes + self.literal_bytes
    }
}

impl std::iter::Sum for Statistics {
    fn sum<I: Iterator<Item = Statistics>>(iter: I) -> Self {
        iter.fold(Statistics::default(), |total, statistics| total + statistics)
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        writeln!(f, "Nodes: {} in {} bytes", self.nodes, self.node_bytes)?;
        writeln!(
            f,
            "Literals: {} pooled in {} bytes",
            self.pooled_literals, self.literal_bytes
        )?;
        writeln!(
            f,
            "References: {} global, {} predefined, {} pooled",
            self.global_references, self.predefined_references, self.pooled_references
        )?;
        write!(f, "Total: {} bytes", self.total_bytes())
    }
}

#[test]
fn test_statistics_sum() {
    let first = Statistics {
        nodes: 3usize.into(),
        node_bytes: 10usize.into(),
        literal_bytes: 4usize.into(),
        ..Default::default()
    };
    let mut total = first.clone() + first;
    total += Statistics {
        pooled_literals: 1usize.into(),
        ..Default::default()
    };
    assert_eq!(total.nodes, Instances::from(6usize));
    assert_eq!(total.total_bytes(), Bytes::from(28usize));
    assert_eq!(total.pooled_literals, Instances::from(1usize));

    let many: Statistics = std::iter::repeat(total).take(3).sum();
    assert_eq!(many.nodes, Instances::from(18usize));
    assert_eq!(
        many.to_string(),
        "Nodes: 18 in 60 bytes\nLiterals: 3 pooled in 24 bytes\n\
         References: 0 global, 0 predefined, 0 pooled\nTotal: 84 bytes"
    );
}
