use std::collections::HashMap;

/// Per-column string dictionary for `CATEGORY` columns.
///
/// Codes are dense, assigned in first-seen order, and never reused. A column
/// stores one `u32` code per row; [`super::MISSING_CATEGORY`] is never a valid
/// code.
#[derive(Debug, Clone, Default)]
pub struct CategoryDictionary {
    values: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl CategoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string and return its code
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&code) = self.lookup.get(s) {
            return code;
        }

        let code = self.values.len() as u32;
        self.values.push(s.to_string());
        self.lookup.insert(s.to_string(), code);
        code
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    pub fn code_of(&self, s: &str) -> Option<u32> {
        self.lookup.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in code order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Lexicographic rank of every code: `ranks[code]` orders codes by their strings.
    pub fn lexicographic_ranks(&self) -> Vec<u32> {
        let mut order: Vec<u32> = (0..self.values.len() as u32).collect();
        order.sort_by(|&a, &b| self.values[a as usize].cmp(&self.values[b as usize]));

        let mut ranks = vec![0u32; self.values.len()];
        for (rank, code) in order.into_iter().enumerate() {
            ranks[code as usize] = rank as u32;
        }
        ranks
    }

    /// Rebuild a dictionary from entries in code order.
    ///
    /// Returns `None` when an entry is repeated, since codes must stay unique.
    pub(crate) fn from_values(values: Vec<String>) -> Option<Self> {
        let mut lookup = HashMap::with_capacity(values.len());
        for (code, value) in values.iter().enumerate() {
            if lookup.insert(value.clone(), code as u32).is_some() {
                return None;
            }
        }
        Some(Self { values, lookup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_reuses_codes() {
        let mut dict = CategoryDictionary::new();
        let a = dict.intern("TX");
        let b = dict.intern("OK");
        let c = dict.intern("TX");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b), Some("OK"));
        assert_eq!(dict.code_of("TX"), Some(a));
        assert_eq!(dict.code_of("KS"), None);
        assert_eq!(dict.get(99), None);
    }

    #[test]
    fn test_lexicographic_ranks() {
        let mut dict = CategoryDictionary::new();
        dict.intern("pear");
        dict.intern("apple");
        dict.intern("fig");

        assert_eq!(dict.lexicographic_ranks(), vec![2, 0, 1]);
    }

    #[test]
    fn test_from_values_rejects_duplicates() {
        assert!(CategoryDictionary::from_values(vec!["a".into(), "b".into()]).is_some());
        assert!(CategoryDictionary::from_values(vec!["a".into(), "a".into()]).is_none());
    }
}
