use parsing::*;

/// The parsed header of a game pak ROM.
///
/// Only the title is required by the front-end (window titles), the remaining
/// fields are kept around for logging and curiosity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    /// Uppercase ASCII, max `12` characters
    pub game_title: String,
    /// Uppercase ASCII, max `4` characters
    pub game_code: String,
    /// Uppercase ASCII, max `2` characters
    pub maker_code: String,
    /// (00h for current hardware revisions)
    pub main_unit_code: u8,
    /// (usually 00h) (bit7=DACS/debug related)
    pub device_type: u8,
    /// (usually 00h)
    pub software_version: u8,
    /// Header complement checksum.
    pub complement_checksum: u8,
}

impl CartridgeHeader {
    /// Parse the header out of the full ROM image.
    ///
    /// Images smaller than the header area parse as an empty header, games
    /// that ship a bad complement checksum merely get a warning.
    pub fn new(rom: &[u8]) -> Self {
        if rom.len() < 0xBE {
            return Self::default();
        }

        let (calculated_chksum, read_chksum) = (Self::calculate_checksum(rom), parse_complement_checksum(rom));

        if calculated_chksum != read_chksum {
            log::warn!(
                "Checksum mismatch! Calculated: {}, Read: {}, continuing cartridge load...",
                calculated_chksum,
                read_chksum
            );
        }

        Self {
            game_title: parse_title(rom),
            game_code: parse_game_code(rom),
            maker_code: parse_maker_code(rom),
            main_unit_code: parse_main_unit_code(rom),
            device_type: parse_device_type(rom),
            software_version: parse_software_version(rom),
            complement_checksum: read_chksum,
        }
    }

    fn calculate_checksum(rom: &[u8]) -> u8 {
        let checksum = rom[0xA0..0xBD].iter().fold(0u8, |acc, &i| acc.wrapping_sub(i));

        checksum.wrapping_sub(0x19)
    }
}

impl Default for CartridgeHeader {
    fn default() -> Self {
        CartridgeHeader {
            game_title: String::new(),
            game_code: String::new(),
            maker_code: String::new(),
            main_unit_code: 0,
            device_type: 0,
            software_version: 0,
            complement_checksum: 0,
        }
    }
}

mod parsing {
    pub fn parse_title(rom: &[u8]) -> String {
        String::from_utf8_lossy(&rom[0xA0..0xAC])
            .trim_matches(char::from(0))
            .to_string()
    }

    pub fn parse_game_code(rom: &[u8]) -> String {
        String::from_utf8_lossy(&rom[0xAC..0xB0])
            .trim_matches(char::from(0))
            .to_string()
    }

    pub fn parse_maker_code(rom: &[u8]) -> String {
        String::from_utf8_lossy(&rom[0xB0..0xB2])
            .trim_matches(char::from(0))
            .to_string()
    }

    pub fn parse_main_unit_code(rom: &[u8]) -> u8 {
        rom[0xB3]
    }

    pub fn parse_device_type(rom: &[u8]) -> u8 {
        rom[0xB4]
    }

    pub fn parse_software_version(rom: &[u8]) -> u8 {
        rom[0xBC]
    }

    pub fn parse_complement_checksum(rom: &[u8]) -> u8 {
        rom[0xBD]
    }
}

#[cfg(test)]
mod tests {
    use super::CartridgeHeader;

    #[test]
    fn title_parses_without_trailing_nuls() {
        let mut rom = vec![0u8; 0x200];
        rom[0xA0..0xA0 + 7].copy_from_slice(b"LUMAEMU");

        let header = CartridgeHeader::new(&rom);
        assert_eq!(header.game_title, "LUMAEMU");
    }
}
