//! Ordered-priority alias resolution
//!
//! A quantity may appear under several names. The first alias, in list
//! order, for which `lookup` yields a value wins. The resolver knows nothing
//! about rows or datasets, so the same policy serves column detection and
//! per-record field probing.

/// Return the first alias whose lookup succeeds, together with its value.
pub fn resolve_first<'a, S, T, F>(aliases: &'a [S], mut lookup: F) -> Option<(&'a str, T)>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Option<T>,
{
    aliases
        .iter()
        .map(|alias| alias.as_ref())
        .find_map(|alias| lookup(alias).map(|value| (alias, value)))
}

/// First alias that names one of `columns`.
pub fn resolve_column<'a, S: AsRef<str>>(aliases: &'a [S], columns: &[String]) -> Option<&'a str> {
    resolve_first(aliases, |alias| columns.iter().any(|c| c == alias).then_some(()))
        .map(|(alias, ())| alias)
}
