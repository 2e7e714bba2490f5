//! Bitmask decoding against a name → bit table.
//!
//! A [`BitField`] pairs a static [`FlagTable`] with a combined mask. Decoding
//! preserves table order, so `to_vec` output is stable for display.

/// Ordered name → bit-value table.
pub type FlagTable = &'static [(&'static str, u64)];

/// Errors from flag lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitFieldError {
    /// The name is not present in the table.
    #[error("{0} is not a valid bitfield value")]
    UnknownFlag(String),
}

/// A flag given either by its table name or as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagRef<'a> {
    Name(&'a str),
    Bits(u64),
}

impl<'a> From<&'a str> for FlagRef<'a> {
    fn from(name: &'a str) -> Self {
        FlagRef::Name(name)
    }
}

impl From<u64> for FlagRef<'_> {
    fn from(bits: u64) -> Self {
        FlagRef::Bits(bits)
    }
}

/// A mask decoded against a flag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    table: FlagTable,
    bits: u64,
}

impl BitField {
    /// Wrap an existing mask.
    pub fn new(table: FlagTable, bits: u64) -> Self {
        Self { table, bits }
    }

    /// Build a mask by OR-ing together a sequence of raw bits.
    pub fn from_bits<I>(table: FlagTable, bits: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut field = Self::new(table, 0);
        for bit in bits {
            field.bits |= bit;
        }
        field
    }

    /// The combined mask.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// The table this field decodes against.
    pub fn table(&self) -> FlagTable {
        self.table
    }

    /// Look up the bit value for a flag name.
    pub fn resolve(&self, name: &str) -> Result<u64, BitFieldError> {
        self.table
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, bit)| *bit)
            .ok_or_else(|| BitFieldError::UnknownFlag(name.to_string()))
    }

    /// Whether the named flag is set.
    pub fn has(&self, name: &str) -> Result<bool, BitFieldError> {
        let bit = self.resolve(name)?;
        Ok(self.bits & bit != 0)
    }

    /// OR a flag into the mask.
    pub fn add<'a>(&mut self, flag: impl Into<FlagRef<'a>>) -> Result<(), BitFieldError> {
        let bit = match flag.into() {
            FlagRef::Name(name) => self.resolve(name)?,
            FlagRef::Bits(bits) => bits,
        };
        self.bits |= bit;
        Ok(())
    }

    /// Names of all set flags, in table order.
    pub fn to_vec(&self) -> Vec<&'static str> {
        self.table
            .iter()
            .filter(|(_, bit)| self.bits & bit != 0)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Iterate over the names of all set flags, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table
            .iter()
            .filter(move |(_, bit)| self.bits & bit != 0)
            .map(|(name, _)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: FlagTable = &[("A", 1), ("B", 2), ("C", 4)];

    #[test]
    fn test_decode_in_table_order() {
        assert_eq!(BitField::new(ABC, 5).to_vec(), vec!["A", "C"]);
        assert_eq!(BitField::new(ABC, 7).to_vec(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_mask() {
        assert!(BitField::new(ABC, 0).to_vec().is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let field = BitField::new(ABC, 1);
        assert_eq!(field.resolve("B").unwrap(), 2);
        assert_eq!(
            field.resolve("Z"),
            Err(BitFieldError::UnknownFlag("Z".to_string()))
        );
        assert!(field.has("Z").is_err());
    }

    #[test]
    fn test_has() {
        let field = BitField::new(ABC, 5);
        assert!(field.has("A").unwrap());
        assert!(!field.has("B").unwrap());
        assert!(field.has("C").unwrap());
    }

    #[test]
    fn test_from_bits_and_add() {
        let mut field = BitField::from_bits(ABC, [1, 4]);
        assert_eq!(field.bits(), 5);

        field.add("B").unwrap();
        assert_eq!(field.bits(), 7);

        let mut field = BitField::new(ABC, 0);
        field.add(4u64).unwrap();
        assert_eq!(field.to_vec(), vec!["C"]);
        assert!(field.add("nope").is_err());
        assert_eq!(field.bits(), 4);
    }

    #[test]
    fn test_wide_bits() {
        const WIDE: FlagTable = &[("LOW", 1), ("HIGH", 1 << 40), ("TOP", 1 << 63)];
        let field = BitField::new(WIDE, (1 << 40) | (1 << 63));
        assert_eq!(field.to_vec(), vec!["HIGH", "TOP"]);
        assert!(!field.has("LOW").unwrap());
    }
}
