//! Field validation for incoming member and club payloads. Keep logic minimal
//! and deterministic; both services call these before touching storage.

use crate::{CoreError, NewClub, NewMember};

/// Maximum description length of a club, in characters.
///
/// Counted in Unicode scalar values, so a character outside the Basic
/// Multilingual Plane (an emoji, say) counts once rather than as the two
/// UTF-16 code units a JavaScript `length` would report.
pub const MAX_DESCRIPTION_CHARS: usize = 100;

const IMAGE_SCHEMES: [&str; 3] = ["http", "https", "ftp"];
const MAX_IMAGE_URL_LEN: usize = 2048;

fn require_non_empty(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidField {
            field,
            reason: "no puede estar vacio",
        });
    }
    Ok(())
}

fn bad_image(reason: &'static str) -> CoreError {
    CoreError::InvalidField {
        field: "image",
        reason,
    }
}

// Dotted domain name ending in an alphabetic TLD of two or more letters.
fn is_domain_with_tld(host: &str) -> bool {
    let Some((_, tld)) = host.rsplit_once('.') else {
        return false;
    };
    let labels_ok = host.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    labels_ok && tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic)
}

/// Validate an image reference.
///
/// The scheme is optional; when present it must be http, https or ftp. The
/// host must be a domain with a top-level domain or an IPv4 address, so
/// `https://localhost` is rejected while `www.example.com/a.png` passes.
pub fn validate_image_url(s: &str) -> Result<(), CoreError> {
    let trimmed = s.trim();
    require_non_empty("image", trimmed)?;
    if trimmed.len() > MAX_IMAGE_URL_LEN {
        return Err(bad_image("demasiado largo"));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(bad_image("no es una URL valida"));
    }
    let rest = match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            if !IMAGE_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
                return Err(bad_image("protocolo no permitido"));
            }
            rest
        }
        None => trimmed,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return Err(bad_image("puerto invalido")),
        None => host_port,
    };
    if host.parse::<std::net::Ipv4Addr>().is_ok() || is_domain_with_tld(host) {
        Ok(())
    } else {
        Err(bad_image("debe incluir un dominio valido"))
    }
}

/// Validate a member payload. The email rule is checked first so that a
/// malformed address is always reported as such; an address holding "@" is
/// never empty.
pub fn validate_member(input: &NewMember) -> Result<(), CoreError> {
    if !input.email.contains('@') {
        return Err(CoreError::InvalidEmail);
    }
    require_non_empty("name", &input.name)?;
    Ok(())
}

/// Validate a club payload. An over-long description wins over any other
/// field error.
pub fn validate_club(input: &NewClub) -> Result<(), CoreError> {
    if input.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(CoreError::DescriptionTooLong);
    }
    require_non_empty("name", &input.name)?;
    validate_image_url(&input.image)?;
    require_non_empty("description", &input.description)?;
    Ok(())
}
