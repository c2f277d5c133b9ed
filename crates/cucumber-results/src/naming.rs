//! Path-safe, sibling-unique identifiers.
//!
//! A node's safe name is computed the first time it is asked for and cached
//! for the node's lifetime. Uniqueness is scoped to the owning collection:
//! each parent keeps a [`SiblingNames`] arena recording every name it has
//! handed out, so later siblings with the same declared name receive `_2`,
//! `_3`, and so on. Names already handed out are never revisited, which keeps
//! links stable when more siblings arrive through a merge.

use std::sync::{Mutex, MutexGuard, OnceLock};

use hashbrown::{HashMap, HashSet};

/// Delimiter between a base name and its disambiguating suffix.
pub const SUFFIX_DELIMITER: char = '_';

const REPLACEMENT: char = '_';

/// Replace characters that are illegal in path segments or anchors.
///
/// # Examples
/// ```
/// use cucumber_results::naming::safe;
///
/// assert_eq!(safe("a/b:c?d#e%f<g>h\\i"), "a_b_c_d_e_f_g_h_i");
/// assert_eq!(safe(""), "_");
/// ```
#[must_use]
pub fn safe(name: &str) -> String {
    let sanitised: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '?' | '#' | '%' | '<' | '>' => REPLACEMENT,
            c if c.is_control() => REPLACEMENT,
            c => c,
        })
        .collect();
    if sanitised.is_empty() {
        REPLACEMENT.to_string()
    } else {
        sanitised
    }
}

/// Arena of names handed out within one owning collection.
#[derive(Debug, Default)]
pub struct SiblingNames {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SiblingNames {
    /// Claim a unique name derived from `base`.
    ///
    /// The first claim of a base returns it unchanged; later claims append
    /// `_2`, `_3`, ... skipping any candidate already taken.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::naming::SiblingNames;
    ///
    /// let mut names = SiblingNames::default();
    /// assert_eq!(names.claim("login"), "login");
    /// assert_eq!(names.claim("login"), "login_2");
    /// assert_eq!(names.claim("login"), "login_3");
    /// ```
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let suffix = self.next_suffix.entry(base.to_string()).or_insert(2);
        loop {
            let candidate = format!("{base}{SUFFIX_DELIMITER}{suffix}");
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Reserve an exact name. Returns `false` when it is already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    /// Whether `name` has been handed out.
    #[must_use]
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Shared handle to a [`SiblingNames`] arena owned by a parent node.
#[derive(Debug, Default)]
pub(crate) struct NameArena(Mutex<SiblingNames>);

impl NameArena {
    pub(crate) fn lock(&self) -> MutexGuard<'_, SiblingNames> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Lazily computed, write-once safe name of a node.
#[derive(Debug, Default)]
pub(crate) struct SafeNameCell(OnceLock<String>);

impl SafeNameCell {
    pub(crate) fn get_or_claim(&self, arena: &NameArena, base: impl FnOnce() -> String) -> &str {
        self.0.get_or_init(|| arena.lock().claim(&base()))
    }

    pub(crate) fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }

    /// Move the cached name into a new arena, re-claiming it on collision.
    ///
    /// Used when a node changes owner during a merge: the old arena is gone, so
    /// the name only has to be unique among its new siblings.
    pub(crate) fn adopt_into(&mut self, arena: &NameArena) {
        let Some(current) = self.0.take() else {
            return;
        };
        let mut names = arena.lock();
        let adopted = if names.reserve(&current) {
            current
        } else {
            names.claim(&current)
        };
        self.0 = OnceLock::from(adopted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain name", "plain name")]
    #[case("path/to\\file", "path_to_file")]
    #[case("query?x=1#frag", "query_x=1_frag")]
    #[case("100% <done>", "100_ _done_")]
    #[case("tab\there", "tab_here")]
    fn sanitises_illegal_characters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(safe(input), expected);
    }

    #[test]
    fn generated_suffix_skips_literal_sibling() {
        let mut names = SiblingNames::default();
        assert_eq!(names.claim("name_2"), "name_2");
        assert_eq!(names.claim("name"), "name");
        assert_eq!(names.claim("name"), "name_3");
    }

    #[test]
    fn claimed_names_are_unique() {
        let mut names = SiblingNames::default();
        let claimed: Vec<_> = ["a", "a", "a_2", "b", "a"]
            .into_iter()
            .map(|base| names.claim(base))
            .collect();
        let unique: HashSet<_> = claimed.iter().collect();
        assert_eq!(unique.len(), claimed.len(), "{claimed:?}");
    }

    #[test]
    fn cell_caches_first_claim() {
        let arena = NameArena::default();
        let cell = SafeNameCell::default();
        assert_eq!(cell.get_or_claim(&arena, || "x".into()), "x");
        assert_eq!(cell.get_or_claim(&arena, || "other".into()), "x");
        assert!(!arena.lock().is_taken("other"));
    }

    #[test]
    fn adoption_keeps_free_names_and_renames_collisions() {
        let base = NameArena::default();
        assert_eq!(base.lock().claim("feature"), "feature");

        let other = NameArena::default();
        let mut colliding = SafeNameCell::default();
        colliding.get_or_claim(&other, || "feature".into());
        let mut free = SafeNameCell::default();
        free.get_or_claim(&other, || "unique".into());

        colliding.adopt_into(&base);
        free.adopt_into(&base);
        assert_eq!(colliding.get(), Some("feature_2"));
        assert_eq!(free.get(), Some("unique"));
    }
}
