//! Renders assembled programs for the outside world.
use std::fmt::Write;
use std::str::FromStr;

use crate::assembler::ast::Command;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    /// Each word as a big-endian u16.
    Binary,
    /// Three hex digits per line, as read by `$readmemh`.
    Hex,
    /// Initialisation statements for the instruction memory of the core.
    Verilog,
    /// `index<TAB>mnemonic` per line.
    Listing,
}

impl Format {
    pub const NAMES: [&'static str; 4] = ["binary", "hex", "verilog", "listing"];
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Format::Binary),
            "hex" => Ok(Format::Hex),
            "verilog" => Ok(Format::Verilog),
            "listing" => Ok(Format::Listing),
            _ => Err(format!("unknown output format `{}`", s)),
        }
    }
}

/// `commands` and `words` must be the same length.
pub fn render(format: Format, commands: &[Command], words: &[u16]) -> Vec<u8> {
    match format {
        Format::Binary => words.iter().flat_map(|w| w.to_be_bytes().to_vec()).collect(),
        Format::Hex => words.iter().map(|w| format!("{:03X}\n", w)).collect::<String>().into_bytes(),
        Format::Verilog => {
            let mut out = String::new();
            for (i, w) in words.iter().enumerate() {
                writeln!(out, "core.instruction_memory[{}] = 12'b{:012b};", i, w).ok();
            }
            out.into_bytes()
        }
        Format::Listing => listing(commands).into_bytes(),
    }
}

pub fn listing(commands: &[Command]) -> String {
    let mut out = String::new();
    for (i, command) in commands.iter().enumerate() {
        writeln!(out, "{}\t{}", i, command.operation).ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::parser::Assembler;

    fn program() -> (Vec<Command>, Vec<u16>) {
        let program = Assembler::new("LOADI R0 5\nstart: PUSH R1O\nLOADI R2 start\n").run();
        assert_eq!(program.error_count(), 0);
        let words = program.words().unwrap();
        (program.commands, words)
    }

    #[test]
    fn test_format_names() {
        for name in Format::NAMES.iter() {
            assert!(name.parse::<Format>().is_ok());
        }
        assert!("elf".parse::<Format>().is_err());
    }

    #[test]
    fn test_binary() {
        let (commands, words) = program();
        let out = render(Format::Binary, &commands, &words);
        assert_eq!(out.len(), 6);
        assert_eq!(&out[..2], &[0x08, 0x05]);
    }

    #[test]
    fn test_hex() {
        let (commands, words) = program();
        assert_eq!(render(Format::Hex, &commands, &words), b"805\n343\nC01\n".to_vec());
    }

    #[test]
    fn test_verilog() {
        let (commands, words) = program();
        let out = String::from_utf8(render(Format::Verilog, &commands, &words)).unwrap();
        assert_eq!(out.lines().next(), Some("core.instruction_memory[0] = 12'b100000000101;"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_listing() {
        let (commands, _) = program();
        assert_eq!(listing(&commands), "0\tLOADI R0S, 5\n1\tPUSH R1O\n2\tLOADI R2S, 1\n");
    }
}
