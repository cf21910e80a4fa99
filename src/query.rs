/// Build the effective search string from the free-text term and an optional category name.
///
/// With a category the two are joined by a space and trimmed, so an empty term yields just the
/// category name. Without one the term is returned untouched (empty included).
pub fn compose(term: &str, category_name: Option<&str>) -> String {
  match category_name {
    Some(name) => format!("{} {}", term, name).trim().to_string(),
    None => term.to_string(),
  }
}
