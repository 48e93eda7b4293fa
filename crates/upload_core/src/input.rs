/// Splits raw user input into candidate locators.
///
/// Lines whose trimmed form is empty are dropped. Kept lines are returned
/// exactly as typed; trimming only decides emptiness.
pub fn parse_locators(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
