pub fn isspace(ch: u8) -> bool {
    matches!(ch, b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r' | b' ')
}

pub fn ispunct(ch: u8) -> bool {
    matches!(ch,
        b'!'..=b'/' | b':'..=b'@' | b'['..=b'`' | b'{'..=b'~')
}

pub fn isdigit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

pub fn isalpha(ch: u8) -> bool {
    ch.is_ascii_alphabetic()
}

pub fn isalnum(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
}
