const BYTES_PER_LINE: usize = 16;

/// Render `bytes` as uppercase hex pairs, sixteen per line.
///
/// Pairs on a line are separated by one space and lines by `\n`; the output
/// has no trailing newline. Works on any buffer, parseable or not.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            text.push(if index % BYTES_PER_LINE == 0 { '\n' } else { ' ' });
        }
        text.push_str(&format!("{byte:02X}"));
    }
    text
}
