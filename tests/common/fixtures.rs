//! Response body builders mirroring the remote API's record format

/// Listing page: one `<Result>` per parent key
pub fn listing_page(keys: &[String]) -> String {
    let mut results = String::new();
    for key in keys {
        results.push_str(&format!(
            "  <Result>\n    <order_number>{key}</order_number>\n    <status>2</status>\n  </Result>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n{results}</Response>"
    )
}

/// Detail page: one `<Result>` per (line_no, jan_cd) pair
pub fn detail_body(lines: &[(&str, &str)]) -> String {
    let mut results = String::new();
    for (line_no, jan_cd) in lines {
        results.push_str(&format!(
            "  <Result>\n    <line_no>{line_no}</line_no>\n    <jan_cd>{jan_cd}</jan_cd>\n    <quantity>1</quantity>\n  </Result>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n{results}</Response>"
    )
}

/// Component page: one `<Result>` per component code
pub fn component_body(codes: &[&str]) -> String {
    let mut results = String::new();
    for code in codes {
        results.push_str(&format!(
            "  <Result>\n    <jan_cd>{code}</jan_cd>\n    <quantity>2</quantity>\n  </Result>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n{results}</Response>"
    )
}

/// Empty response page (zero records)
pub fn empty_page() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n</Response>".to_string()
}

/// Sequential parent keys `P001`, `P002`, ...
pub fn parent_keys(from: usize, to: usize) -> Vec<String> {
    (from..=to).map(|i| format!("P{i:03}")).collect()
}
