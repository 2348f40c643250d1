use anyhow::{Result, anyhow};

/// `HH:MM:SS.mmm`, used by the TXT format.
pub fn format_timestamp(ms_in: i64) -> String {
    let ms = ms_in.max(0);

    let total_seconds = ms / 1000;
    let milli = ms % 1000;

    let sec = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let min = total_minutes % 60;
    let hour = total_minutes / 60;

    format!("{hour:02}:{min:02}:{sec:02}.{milli:03}")
}

/// Compact display clock: `M:SS.t`, or `H:MM:SS` past an hour. Rounds only here.
pub fn format_clock(ms: f64) -> String {
    let tenths = (ms.max(0.0) / 100.0).floor() as i64;
    let total_seconds = tenths / 10;
    let tenth = tenths % 10;
    let sec = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let min = total_minutes % 60;
    let hour = total_minutes / 60;

    if hour > 0 {
        format!("{hour}:{min:02}:{sec:02}")
    } else {
        format!("{min}:{sec:02}.{tenth}")
    }
}

pub fn parse_time_to_ms(s: &str) -> Result<i64> {
    let t = s.trim();

    if let Ok(v) = t.parse::<i64>() {
        return Ok(v);
    }

    if let Some(secs) = t.strip_suffix('s') {
        if let Ok(v) = secs.trim().parse::<f64>() {
            return Ok((v * 1000.0).round() as i64);
        }
    }

    if let Ok(v) = t.parse::<f64>() {
        let ms = (v * 1000.0).round() as i64;
        return Ok(ms);
    }

    let (hms, milli) = if let Some((a, b)) = t.split_once(',') {
        (a, Some(b))
    } else if let Some((a, b)) = t.split_once('.') {
        (a, Some(b))
    } else {
        (t, None)
    };

    let parts: Vec<&str> = hms.split(':').collect();
    let (h, m, s2) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(anyhow!("unrecognized timestamp: '{t}'")),
    };

    let h: i64 = h.parse().map_err(|_| anyhow!("bad hours: '{t}'"))?;
    let m: i64 = m.parse().map_err(|_| anyhow!("bad minutes: '{t}'"))?;
    let s2: i64 = s2.parse().map_err(|_| anyhow!("bad seconds: '{t}'"))?;

    let mut ms = ((h * 60 + m) * 60 + s2) * 1000;

    if let Some(frac) = milli {
        let mut frac_s = frac.trim().to_string();
        if frac_s.len() > 3 {
            frac_s.truncate(3);
        }
        while frac_s.len() < 3 {
            frac_s.push('0');
        }
        let milli: i64 = frac_s
            .parse()
            .map_err(|_| anyhow!("bad milliseconds: '{t}'"))?;
        ms += milli;
    }

    Ok(ms)
}

pub fn parse_time_range_arrow(line: &str) -> Result<(i64, i64)> {
    let (a, b) = line
        .split_once("-->")
        .ok_or_else(|| anyhow!("missing '-->' in time range: '{line}'"))?;
    let start = parse_time_to_ms(a.trim())?;
    let end = parse_time_to_ms(b.trim())?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_shapes() {
        assert_eq!(parse_time_to_ms("1500").unwrap(), 1500);
        assert_eq!(parse_time_to_ms("2.5s").unwrap(), 2500);
        assert_eq!(parse_time_to_ms("00:01:02,250").unwrap(), 62_250);
        assert_eq!(parse_time_to_ms("01:02.5").unwrap(), 62_500);
        assert!(parse_time_to_ms("nope").is_err());
    }

    #[test]
    fn formats_display_clock() {
        assert_eq!(format_clock(0.0), "0:00.0");
        assert_eq!(format_clock(65_432.0), "1:05.4");
        assert_eq!(format_clock(3_725_000.0), "1:02:05");
        assert_eq!(format_timestamp(62_250), "00:01:02.250");
    }
}
