use crate::foundation::core::Rgba8;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Parse the CSS color subset stored in documents: hex (`#rgb`, `#rgba`, `#rrggbb`,
/// `#rrggbbaa`), `rgb()`/`rgba()` and a few keywords.
pub(crate) fn parse_css_color(s: &str) -> ComposerResult<Rgba8> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "transparent" | "none" => return Ok(Rgba8::transparent()),
        "white" => return Ok(Rgba8::new(255, 255, 255, 255)),
        "black" => return Ok(Rgba8::new(0, 0, 0, 255)),
        _ => {}
    }

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    if let Some(body) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_fn(body);
    }

    Err(ComposerError::validation(format!(
        "unsupported color \"{s}\""
    )))
}

fn parse_hex(hex: &str) -> ComposerResult<Rgba8> {
    fn nibble(c: u8) -> ComposerResult<u8> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| ComposerError::validation(format!("invalid hex digit '{}'", c as char)))
    }

    let b = hex.as_bytes();
    let mut out = [0u8, 0, 0, 255];
    match b.len() {
        3 | 4 => {
            for (i, &c) in b.iter().enumerate() {
                let v = nibble(c)?;
                out[i] = v * 17;
            }
        }
        6 | 8 => {
            for i in 0..b.len() / 2 {
                out[i] = nibble(b[2 * i])? * 16 + nibble(b[2 * i + 1])?;
            }
        }
        _ => {
            return Err(ComposerError::validation(
                "hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA",
            ));
        }
    }
    Ok(Rgba8::new(out[0], out[1], out[2], out[3]))
}

fn parse_rgb_fn(body: &str) -> ComposerResult<Rgba8> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ComposerError::validation(
            "rgb()/rgba() expects 3 or 4 components",
        ));
    }
    let channel = |p: &str| -> ComposerResult<u8> {
        let v: f64 = p
            .parse()
            .map_err(|_| ComposerError::validation(format!("invalid color channel \"{p}\"")))?;
        Ok(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            let v: f64 = p
                .parse()
                .map_err(|_| ComposerError::validation(format!("invalid alpha \"{p}\"")))?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Ok(Rgba8::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}
