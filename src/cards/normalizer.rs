use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUANTITY_RE: Regex = Regex::new(r"(?i)^\s*\d+x\s+").unwrap();
    // "<buyer> kupił(a) ..." -> drop everything up to the purchase verb
    static ref PURCHASER_RE: Regex = Regex::new(r"(?i)^.*?\bkupi\S*\s+").unwrap();
}

/// Cleans a raw candidate name before it is looked up.
///
/// Removes a leading quantity (`2x `), then a leading "<buyer> bought" phrase,
/// then keeps only the text after the last colon, then trims.
pub fn normalize_name(raw: &str) -> String {
    let name = QUANTITY_RE.replace(raw, "");
    let name = PURCHASER_RE.replace(&name, "");

    let name = match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => &name[..],
    };

    name.trim().to_string()
}
