use rustc_hash::FxHashSet;
use unicase::UniCase;

/// Allocates schema names that are unique within a collection.
///
/// Name comparisons are case-insensitive: `pet` and `Pet` count as the
/// same name, so an allocated name stays unique even in a generator that
/// folds case.
///
/// # Examples
///
/// ```
/// # use dimorph::transform::UniqueNames;
/// let mut names = UniqueNames::with_reserved(["Pet"]);
/// assert_eq!(names.allocate("Pet"), "Pet2");
/// assert_eq!(names.allocate("Pet"), "Pet3");
/// assert_eq!(names.allocate("Toy"), "Toy");
/// ```
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: FxHashSet<UniCase<String>>,
}

impl UniqueNames {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with the given names already taken.
    pub fn with_reserved<S: Into<String>>(reserved: impl IntoIterator<Item = S>) -> Self {
        let mut names = Self::new();
        for name in reserved {
            names.reserve(name);
        }
        names
    }

    /// Marks a name as taken without allocating it.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(UniCase::new(name.into()));
    }

    /// Claims `base` if it's free; otherwise claims `base` with the first
    /// numeric suffix, counting from 2, that makes it unique.
    pub fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(UniCase::new(base.to_owned())) {
            return base.to_owned();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.taken.insert(UniCase::new(candidate.clone())) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_free_name() {
        let mut names = UniqueNames::new();
        assert_eq!(names.allocate("Pet"), "Pet");
        assert_eq!(names.allocate("Pet"), "Pet2");
        assert_eq!(names.allocate("Pet"), "Pet3");
    }

    #[test]
    fn test_allocate_skips_taken_suffixes() {
        let mut names = UniqueNames::with_reserved(["Pet", "Pet2", "Pet3"]);
        assert_eq!(names.allocate("Pet"), "Pet4");
    }

    #[test]
    fn test_reserved_names_are_taken() {
        let mut names = UniqueNames::with_reserved(["Pet"]);
        assert_eq!(names.allocate("Pet"), "Pet2");
        assert_eq!(names.allocate("Toy"), "Toy");
    }

    #[test]
    fn test_case_insensitive_collisions() {
        let mut names = UniqueNames::with_reserved(["pet"]);
        assert_eq!(names.allocate("Pet"), "Pet2");
        names.reserve("PET3");
        assert_eq!(names.allocate("Pet"), "Pet4");
    }
}
