/// Normalizes a provider-supplied ISO-4217 code to the uppercase form stored on payments.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
