//! BIP21 payment URIs: `bitcoin:<address>[;version=<v>][?amount=..&label=..&message=..]`

use std::collections::BTreeMap;

use serde::Serialize;

const SATS_PER_BTC: u64 = 100_000_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BitcoinPaymentData {
    pub address: String,
    pub version: Option<String>,
    pub amount_sat: Option<u64>,
    pub label: Option<String>,
    pub message: Option<String>,
    /// Remaining query parameters, including an `amount` that did not parse.
    pub parameters: BTreeMap<String, String>,
}

impl BitcoinPaymentData {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentAddressParser {
    valid_scheme: &'static str,
    remove_scheme: bool,
}

impl Default for PaymentAddressParser {
    fn default() -> Self {
        Self::new("bitcoin", true)
    }
}

impl PaymentAddressParser {
    pub fn new(valid_scheme: &'static str, remove_scheme: bool) -> Self {
        Self { valid_scheme, remove_scheme }
    }

    pub fn scheme(&self) -> &'static str { self.valid_scheme }

    /// Never fails: input without a recognised scheme is taken as a bare address.
    pub fn parse(&self, text: &str) -> BitcoinPaymentData {
        let text = text.trim();
        let (rest, had_scheme) = match text.split_once(':') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case(self.valid_scheme) => (rest, true),
            _ => (text, false),
        };

        let (head, query) = rest.split_once('?').unwrap_or((rest, ""));
        let (address, version) = match head.split_once(';') {
            Some((address, params)) => (address, params.strip_prefix("version=").map(str::to_string)),
            None => (head, None),
        };

        let address = if had_scheme && !self.remove_scheme {
            format!("{}:{}", self.valid_scheme, address)
        } else {
            address.to_string()
        };

        let mut data = BitcoinPaymentData { address, version, ..Default::default() };
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match key {
                "amount" => match parse_btc_amount(&value) {
                    Some(sats) => data.amount_sat = Some(sats),
                    None => {
                        data.parameters.insert(key.to_string(), value);
                    }
                },
                "label" => data.label = Some(value),
                "message" => data.message = Some(value),
                _ => {
                    data.parameters.insert(key.to_string(), value);
                }
            }
        }
        data
    }

    pub fn uri(&self, data: &BitcoinPaymentData) -> String {
        let mut uri = format!("{}:{}", self.valid_scheme, data.address);
        if let Some(ref version) = data.version {
            uri.push_str(";version=");
            uri.push_str(version);
        }

        let mut query = Vec::new();
        if let Some(amount) = data.amount_sat {
            query.push(format!("amount={}", format_btc_amount(amount)));
        }
        if let Some(ref label) = data.label {
            query.push(format!("label={}", percent_encode(label)));
        }
        if let Some(ref message) = data.message {
            query.push(format!("message={}", percent_encode(message)));
        }
        for (key, value) in &data.parameters {
            query.push(format!("{}={}", key, percent_encode(value)));
        }
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.join("&"));
        }
        uri
    }
}

fn format_btc_amount(amount_sat: u64) -> String {
    let whole = amount_sat / SATS_PER_BTC;
    let frac = amount_sat % SATS_PER_BTC;
    format!("{}.{:08}", whole, frac)
}

/// Decimal BTC → satoshis. At most 8 fractional digits.
fn parse_btc_amount(value: &str) -> Option<u64> {
    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
    if (whole.is_empty() && frac.is_empty()) || frac.len() > 8 {
        return None;
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u64 = format!("{:0<8}", frac).parse().ok()?;
    whole.checked_mul(SATS_PER_BTC)?.checked_add(frac)
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for &b in value.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = match bytes.get(i..i + 3) {
            Some([b'%', hi, lo]) => hex_value(*hi).zip(hex_value(*lo)).map(|(h, l)| h << 4 | l),
            _ => None,
        };
        match escaped {
            Some(b) => {
                out.push(b);
                i += 3;
            }
            None => {
                out.push(if bytes[i] == b'+' { b' ' } else { bytes[i] });
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
