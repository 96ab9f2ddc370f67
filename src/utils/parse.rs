use std::net::Ipv4Addr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("ParseError: {reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: String) -> Self {
        ParseError { reason }
    }
}

/// Convert an ASN string to a u32
/// E.g. "65000.100" -> 4259840100
pub fn asn_from_dotted(value: &str) -> std::result::Result<u32, ParseError> {
    // Parse to list of u32, since we should support 4 byte ASN as a single int
    // (E.g. "4259840100")
    let mut chunks = [0; 2];
    let check_for_overflow = value.contains('.');
    // Iterate through chunks in reverse, so if there's no dot (only one number),
    // it will be in the least significant position
    for (i, chunk) in value
        .splitn(2, '.')
        .collect::<Vec<&str>>()
        .into_iter()
        .rev()
        .enumerate()
    {
        // `u32::from_str` accepts a leading '+', FRR does not
        if chunk.is_empty() || !chunk.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::new(format!("Invalid ASN '{}'", value)));
        }
        let chunk: u32 = chunk
            .parse()
            .map_err(|err| ParseError::new(format!("{} '{}'", err, value)))?;
        if check_for_overflow && chunk > std::u16::MAX as u32 {
            return Err(ParseError::new(format!("Unsupported ASN '{}'", value)));
        }
        chunks[i] = chunk;
    }
    Ok((chunks[1] * 65536) + chunks[0])
}

/// Parse an IPv4 literal as written in a `neighbor` statement
/// Hostnames, IPv6 addresses and peer-group names yield `None`
pub fn ipv4_literal(value: &str) -> Option<Ipv4Addr> {
    if value.split('.').count() != 4 {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asn_from_dotted() {
        assert_eq!(asn_from_dotted("100"), Ok(100));
        assert_eq!(asn_from_dotted("65000.100"), Ok(4259840100));
        assert_eq!(asn_from_dotted("4259840100"), Ok(4259840100));
        assert!(asn_from_dotted("65536.1").is_err());
        assert!(asn_from_dotted("internal").is_err());
        assert!(asn_from_dotted("+100").is_err());
        assert!(asn_from_dotted("").is_err());
    }

    #[test]
    fn test_ipv4_literal() {
        assert_eq!(ipv4_literal("10.0.1.1"), Some(Ipv4Addr::new(10, 0, 1, 1)));
        assert_eq!(ipv4_literal("2001:db8::1"), None);
        assert_eq!(ipv4_literal("peer1.example.net"), None);
        assert_eq!(ipv4_literal("UPSTREAM"), None);
        assert_eq!(ipv4_literal("10.0.1"), None);
        assert_eq!(ipv4_literal("10.0.1.256"), None);
    }
}
