//! The Parser module turns assembly source text into a resolved list of
//! commands in two passes.
//!
//! The first pass reads labels and commands straight off the cursor. A
//! `LOADI` whose operand is a name rather than a number becomes a
//! symbolic placeholder. When a command cannot be parsed the rest of
//! its line is skipped, so one run reports every bad line.
//! The second pass replaces each placeholder with the instruction index
//! of its label.
use std::collections::HashMap;

use super::ast::*;
use super::encoder::EncodeError;
use crate::syntax::cursor::{Cursor, Diagnostic};
use crate::syntax::Grammar;

/// The result of an assembler run. Only usable if `error_count` is zero.
#[derive(Debug)]
pub struct Program {
    pub commands: Vec<Command>,
    pub labels: HashMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Assembles every command. Fails on the first unencodable one.
    pub fn words(&self) -> Result<Vec<u16>, EncodeError> {
        self.commands.iter().map(|c| c.operation.assemble()).collect()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    ExpectLabelsOrCommand,
    ParsingCommand,
    Resolve,
    Done,
}

pub struct Assembler {
    cursor: Cursor,
    commands: Vec<Command>,
    labels: HashMap<String, usize>,
}

impl Grammar for Assembler {
    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

impl Assembler {
    pub fn new(source: &str) -> Self {
        Assembler {
            cursor: Cursor::new(source, Some("#")),
            commands: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Run the assembler, consuming itself and returning the program.
    pub fn run(mut self) -> Program {
        let mut state = State::ExpectLabelsOrCommand;
        loop {
            state = match state {
                State::ExpectLabelsOrCommand => {
                    while self.label() {}
                    self.cursor.skip_trivia();
                    if self.cursor.eof() {
                        State::Resolve
                    } else {
                        State::ParsingCommand
                    }
                }
                State::ParsingCommand => {
                    let errors_before = self.cursor.errors();
                    let start = self.cursor.mark();
                    match self.command() {
                        Some(command) => self.commands.push(command),
                        None => {
                            if self.cursor.errors() == errors_before {
                                self.cursor.error_at("Expected command", start);
                            }
                            self.cursor.rollback(start);
                            self.cursor.skip_line();
                        }
                    }
                    State::ExpectLabelsOrCommand
                }
                State::Resolve => {
                    self.resolve();
                    State::Done
                }
                State::Done => break,
            };
        }

        debug!(
            "assembled {} command(s) with {} label(s) and {} error(s)",
            self.commands.len(),
            self.labels.len(),
            self.cursor.errors()
        );
        Program {
            commands: self.commands,
            labels: self.labels,
            diagnostics: self.cursor.into_diagnostics(),
        }
    }

    /// Replaces every symbolic `LOADI` whose label is known. Reports all
    /// unknown labels, not just the first.
    fn resolve(&mut self) {
        for i in 0..self.commands.len() {
            let (target, label) = match &self.commands[i].operation {
                Operation::SymbolicLoadImmediate { target, label } => (*target, label.clone()),
                _ => continue,
            };
            let offset = self.commands[i].offset;
            match self.labels.get(&label) {
                None => self.cursor.error_at(&format!("Symbol '{}' is not defined", label), offset),
                Some(&index) if index > usize::from(u8::MAX) => self.cursor.error_at(
                    &format!("Symbol '{}' resolves to {}, which does not fit in 8 bits", label, index),
                    offset,
                ),
                Some(&index) => {
                    trace!("resolved '{}' to {}", label, index);
                    self.commands[i].operation = Operation::LoadImmediate { target, value: index as u8 };
                }
            }
        }
    }

    /// `name:`. The label refers to the next command.
    fn label(&mut self) -> bool {
        self.parse(|p, begin| {
            let name = p.word()?;
            if !p.cursor.match_str(":") {
                return None;
            }
            if p.labels.contains_key(&name) {
                p.cursor.error_at(&format!("Label '{}' redefined", name), begin);
            } else {
                trace!("label '{}' = {}", name, p.commands.len());
                p.labels.insert(name, p.commands.len());
            }
            Some(())
        })
        .is_some()
    }

    /// Reports a missing register right after the preceding token.
    fn register(&mut self, message: &str, wide_only: bool) -> Option<Register> {
        let after_previous = self.cursor.mark();
        self.parse(|p, _| {
            for &reg in Register::ALL.iter() {
                if wide_only && reg.wide_name().is_none() {
                    continue;
                }
                if reg.names().any(|name| p.cursor.match_word(name)) {
                    return Some(reg);
                }
            }
            p.cursor.error_at(message, after_previous);
            None
        })
    }

    fn target_and_source(&mut self, wide_source: bool) -> Option<(Register, Register)> {
        let target = self.register("Target register expected", false)?;
        self.cursor.match_str(",");
        let source = self.register("Source register expected", wide_source)?;
        Some((target, source))
    }

    fn command(&mut self) -> Option<Command> {
        self.parse(|p, begin| {
            let operation = p.operation()?;
            Some(Command { operation, offset: begin })
        })
    }

    /// Dispatches on the mnemonic. Each branch commits once its keyword
    /// matched; keywords are whole words so none shadows a longer one.
    fn operation(&mut self) -> Option<Operation> {
        for &(mnemonic, wide) in [("LOAD8", false), ("LOAD16", true)].iter() {
            if self.cursor.match_word(mnemonic) {
                let (register, memory) = self.target_and_source(true)?;
                return Some(Operation::Load { register, memory, wide });
            }
        }
        for &(mnemonic, wide) in [("STORE8", false), ("STORE16", true)].iter() {
            if self.cursor.match_word(mnemonic) {
                let register = self.register("Source register expected", false)?;
                self.cursor.match_str(",");
                let memory = self.register("Target register expected", false)?;
                return Some(Operation::Store { register, memory, wide });
            }
        }
        if self.cursor.match_word("MOVE") {
            let to = self.register("Target register expected", false)?;
            self.cursor.match_str(",");
            let transform = if self.cursor.match_str("-") {
                Transform::Negate
            } else if self.cursor.match_str("~") {
                Transform::Invert
            } else {
                Transform::None
            };
            let from = self.register("Source register expected", false)?;
            return Some(Operation::Move { to, from, transform });
        }
        if self.cursor.match_word("JUMP") {
            let kind = if self.cursor.match_word("LONG") {
                JumpKind::Long
            } else if self.cursor.match_word("IF") {
                let kind = JumpKind::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.condition().map_or(false, |c| self.cursor.match_word(c)));
                match kind {
                    Some(kind) => kind,
                    None => {
                        self.cursor.error("Condition expected");
                        return None;
                    }
                }
            } else {
                JumpKind::Short
            };
            let target = self.register("Target register expected", false)?;
            return Some(Operation::Jump { target, kind });
        }
        if self.cursor.match_word("CALL") {
            let target = self.register("Target register expected", false)?;
            return Some(Operation::Jump { target, kind: JumpKind::Call });
        }
        for &kind in [StackKind::Push, StackKind::Pop, StackKind::Init].iter() {
            if self.cursor.match_word(kind.mnemonic()) {
                let message = format!("{} register expected", kind.mnemonic());
                let register = self.register(&message, false)?;
                return Some(Operation::Stack { register, kind });
            }
        }
        if self.cursor.match_word("RETURN") {
            let errors_before = self.cursor.errors();
            let arguments = match self.number() {
                Some(n) => n,
                None => {
                    if self.cursor.errors() == errors_before {
                        self.cursor.error("Expected amount of argument bytes");
                    }
                    return None;
                }
            };
            if !(0..=15).contains(&arguments) {
                self.cursor.error("Invalid amount of argument bytes");
                return None;
            }
            return Some(Operation::Return { arguments: arguments as u8 });
        }
        for &(mnemonic, direction) in [("IN", Direction::In), ("OUT", Direction::Out)].iter() {
            if self.cursor.match_word(mnemonic) {
                let register = self.register("I/O register expected", false)?;
                return Some(Operation::Io { register, direction });
            }
        }
        for &kind in CombineKind::ALL.iter() {
            if self.cursor.match_word(kind.mnemonic()) {
                let (target, source) = self.target_and_source(true)?;
                return Some(Operation::Combine { target, source, kind });
            }
        }
        if self.cursor.match_word("LOADI") {
            return self.load_immediate();
        }
        self.cursor.error("Instruction expected");
        None
    }

    fn load_immediate(&mut self) -> Option<Operation> {
        let target = self.register("Target register expected", false)?;
        self.cursor.match_str(",");

        let errors_before = self.cursor.errors();
        if let Some(value) = self.immediate() {
            if !(-128..=255).contains(&value) {
                self.cursor.error(&format!("Immediate {} does not fit in 8 bits", value));
                return None;
            }
            return Some(Operation::LoadImmediate { target, value: value as u8 });
        }
        if self.cursor.errors() != errors_before {
            return None;
        }
        match self.word() {
            Some(label) => Some(Operation::SymbolicLoadImmediate { target, label }),
            None => {
                self.cursor.error("Number or symbol expected");
                None
            }
        }
    }

    /// A number with an optional leading minus sign.
    fn immediate(&mut self) -> Option<i64> {
        self.parse(|p, _| {
            let negative = p.cursor.match_with("-", false);
            if negative && !p.cursor.peek().is_ascii_digit() {
                p.cursor.error("Literal expected after '-'");
                return None;
            }
            let value = p.number()?;
            Some(if negative { -value } else { value })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::encoder::decode;
    use super::*;
    use Register::*;

    fn assemble(source: &str) -> Program {
        Assembler::new(source).run()
    }

    fn operations(program: &Program) -> Vec<Operation> {
        program.commands.iter().map(|c| c.operation.clone()).collect()
    }

    fn messages(program: &Program) -> Vec<&str> {
        program.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_loadi_literal_word() {
        let program = assemble("LOADI R0 5\n");
        assert_eq!(program.error_count(), 0);
        assert_eq!(program.words(), Ok(vec![0b1_000_00000101]));
    }

    #[test]
    fn test_forward_reference() {
        let program = assemble("LOADI R0 loop\nloop: LOADI R1 1\n");
        assert_eq!(program.error_count(), 0);
        assert_eq!(program.labels.get("loop"), Some(&1));
        assert_eq!(
            operations(&program),
            vec![
                Operation::LoadImmediate { target: R0S, value: 1 },
                Operation::LoadImmediate { target: R1S, value: 1 },
            ]
        );
    }

    #[test]
    fn test_backward_reference_and_stacked_labels() {
        let program = assemble("first: second:\nLOADI R0 0\nthird: LOADI R1 first\nLOADI R2 third\nend:");
        assert_eq!(program.error_count(), 0);
        assert_eq!(program.labels["first"], 0);
        assert_eq!(program.labels["second"], 0);
        assert_eq!(program.labels["third"], 1);
        assert_eq!(program.labels["end"], 3);
        assert_eq!(program.commands[1].operation, Operation::LoadImmediate { target: R1S, value: 0 });
        assert_eq!(program.commands[2].operation, Operation::LoadImmediate { target: R2S, value: 1 });
    }

    #[test]
    fn test_unresolved_symbol() {
        let program = assemble("LOADI R0 ghost\n");
        assert_eq!(program.error_count(), 1);
        assert_eq!(messages(&program), vec!["Symbol 'ghost' is not defined"]);
        assert_eq!((program.diagnostics[0].line, program.diagnostics[0].column), (1, 1));
        assert_eq!(program.commands.len(), 1);
        assert_eq!(
            program.words(),
            Err(EncodeError::Unresolved("ghost".to_owned()))
        );
    }

    #[test]
    fn test_every_unresolved_symbol_is_reported() {
        let program = assemble("LOADI R0 a\nLOADI R1 b\nc: LOADI R2 c\n");
        assert_eq!(messages(&program), vec!["Symbol 'a' is not defined", "Symbol 'b' is not defined"]);
        assert_eq!(program.diagnostics[1].line, 2);
    }

    #[test]
    fn test_duplicate_label_keeps_first() {
        let program = assemble("a: LOADI R0 1\na: LOADI R1 2\nLOADI R2 a\n");
        assert_eq!(messages(&program), vec!["Label 'a' redefined"]);
        assert_eq!(program.diagnostics[0].line, 2);
        assert_eq!(program.labels["a"], 0);
        assert_eq!(program.commands[2].operation, Operation::LoadImmediate { target: R2S, value: 0 });
    }

    #[test]
    fn test_every_mnemonic() {
        let source = "
            LOAD8 R0S R1        # wide-capable source
            LOAD16 RG7, R2S
            STORE8 R1O R3O
            STORE16 R0 RG1
            MOVE R0O R1
            MOVE R0O, ~R1
            MOVE R0O -R1
            JUMP R2O
            JUMP LONG R2O
            JUMP IF Z R2O
            JUMP IF S R2O
            JUMP IF C R2O
            JUMP IF O R2O
            JUMP IF SZ R2O
            CALL R3
            PUSH R1O
            POP R1O
            STACK_INIT R0
            RETURN 0xF
            IN R2
            OUT RG3
            ADD R0 R1
            SUB R0 R1
            AND R0 R1
            OR R0 R1
            XOR R0 R1
            ADC R0 R1
            SBB R0 R1
            SHL R0 R1
            SHR R0 R1
            SRS R0 R1
            CMP R3O, R1
            LOADI R3O 0b11111111
            LOADI R0 -1
            LOADI R0 -128
        ";
        let program = assemble(source);
        assert_eq!(messages(&program), Vec::<&str>::new());

        let conditions = [JumpKind::Zero, JumpKind::Sign, JumpKind::Carry, JumpKind::Overflow, JumpKind::SignZero];
        let mut expected = vec![
            Operation::Load { register: R0S, memory: R1S, wide: false },
            Operation::Load { register: R3O, memory: R2S, wide: true },
            Operation::Store { register: R1O, memory: R3O, wide: false },
            Operation::Store { register: R0S, memory: R0O, wide: true },
            Operation::Move { to: R0O, from: R1S, transform: Transform::None },
            Operation::Move { to: R0O, from: R1S, transform: Transform::Invert },
            Operation::Move { to: R0O, from: R1S, transform: Transform::Negate },
            Operation::Jump { target: R2O, kind: JumpKind::Short },
            Operation::Jump { target: R2O, kind: JumpKind::Long },
        ];
        expected.extend(conditions.iter().map(|&kind| Operation::Jump { target: R2O, kind }));
        expected.extend(vec![
            Operation::Jump { target: R3S, kind: JumpKind::Call },
            Operation::Stack { register: R1O, kind: StackKind::Push },
            Operation::Stack { register: R1O, kind: StackKind::Pop },
            Operation::Stack { register: R0S, kind: StackKind::Init },
            Operation::Return { arguments: 15 },
            Operation::Io { register: R2S, direction: Direction::In },
            Operation::Io { register: R1O, direction: Direction::Out },
        ]);
        expected.extend(
            CombineKind::ALL[..10]
                .iter()
                .map(|&kind| Operation::Combine { target: R0S, source: R1S, kind }),
        );
        expected.extend(vec![
            Operation::Combine { target: R3O, source: R1S, kind: CombineKind::Compare },
            Operation::LoadImmediate { target: R3O, value: 0xFF },
            Operation::LoadImmediate { target: R0S, value: 0xFF },
            Operation::LoadImmediate { target: R0S, value: 0x80 },
        ]);
        assert_eq!(operations(&program), expected);

        for (command, word) in program.commands.iter().zip(program.words().unwrap()) {
            assert_eq!(decode(word).as_ref(), Some(&command.operation));
        }
    }

    #[test]
    fn test_register_aliases() {
        for reg in Register::ALL.iter() {
            for name in reg.names() {
                let program = assemble(&format!("PUSH {}", name));
                assert_eq!(operations(&program), vec![Operation::Stack { register: *reg, kind: StackKind::Push }]);
            }
        }
    }

    #[test]
    fn test_near_collisions() {
        // A wide name is a prefix of the canonical name.
        let program = assemble("PUSH R0O\nPUSH R1S\n");
        assert_eq!(
            operations(&program),
            vec![
                Operation::Stack { register: R0O, kind: StackKind::Push },
                Operation::Stack { register: R1S, kind: StackKind::Push },
            ]
        );
        // S is a prefix of SZ.
        let program = assemble("JUMP IF SZ R0\n");
        assert_eq!(operations(&program), vec![Operation::Jump { target: R0S, kind: JumpKind::SignZero }]);
        // A mnemonic followed by more identifier characters is not that mnemonic.
        let program = assemble("ORX R0 R1\n");
        assert_eq!(messages(&program), vec!["Instruction expected"]);
        let program = assemble("LOADIX R0 1\n");
        assert_eq!(messages(&program), vec!["Instruction expected"]);
    }

    #[test]
    fn test_wide_only_source() {
        let program = assemble("LOAD8 R0 R0O\n");
        assert_eq!(messages(&program), vec!["Source register expected"]);
        let program = assemble("ADD R0 RG3\n");
        assert_eq!(messages(&program), vec!["Source register expected"]);
        let program = assemble("ADD R0 RG2\n");
        assert_eq!(program.error_count(), 0);
    }

    #[test]
    fn test_recovery_reports_each_line() {
        let program = assemble("LOADI R0 1\nBOGUS R1\nPUSH\nLOADI R1 2\nPOP R9\nPOP R0\n");
        assert_eq!(
            program.diagnostics.iter().map(|d| (d.line, d.message.as_str())).collect::<Vec<_>>(),
            vec![
                (2, "Instruction expected"),
                (3, "PUSH register expected"),
                (5, "POP register expected"),
            ]
        );
        assert_eq!(program.diagnostics[1].column, 5);
        assert_eq!(
            operations(&program),
            vec![
                Operation::LoadImmediate { target: R0S, value: 1 },
                Operation::LoadImmediate { target: R1S, value: 2 },
                Operation::Stack { register: R0S, kind: StackKind::Pop },
            ]
        );
    }

    #[test]
    fn test_recovery_skips_the_failing_line_only() {
        let program = assemble("MOVE R0 ?\nPUSH R1 # fine\n");
        assert_eq!(messages(&program), vec!["Source register expected"]);
        assert_eq!(operations(&program), vec![Operation::Stack { register: R1S, kind: StackKind::Push }]);
    }

    #[test]
    fn test_no_duplicate_diagnostics() {
        let program = assemble("LOADI R0 0x\n");
        assert_eq!(messages(&program), vec!["Literal expected after prefix"]);
        let program = assemble("RETURN 0b\n");
        assert_eq!(messages(&program), vec!["Literal expected after prefix"]);
        let program = assemble("JUMP IF Q R0\n");
        assert_eq!(messages(&program), vec!["Condition expected"]);
    }

    #[test]
    fn test_return_range() {
        assert_eq!(messages(&assemble("RETURN 16")), vec!["Invalid amount of argument bytes"]);
        assert_eq!(messages(&assemble("RETURN")), vec!["Expected amount of argument bytes"]);
        assert_eq!(operations(&assemble("RETURN 0")), vec![Operation::Return { arguments: 0 }]);
    }

    #[test]
    fn test_loadi_range() {
        assert_eq!(messages(&assemble("LOADI R0 256")), vec!["Immediate 256 does not fit in 8 bits"]);
        assert_eq!(messages(&assemble("LOADI R0 -129")), vec!["Immediate -129 does not fit in 8 bits"]);
        assert_eq!(messages(&assemble("LOADI R0")), vec!["Number or symbol expected"]);
        assert_eq!(
            operations(&assemble("LOADI R0 255")),
            vec![Operation::LoadImmediate { target: R0S, value: 255 }]
        );
    }

    #[test]
    fn test_minus_must_touch_digits() {
        let program = assemble("LOADI R0 - 5\n");
        assert_eq!(messages(&program), vec!["Literal expected after '-'"]);
        assert!(program.commands.is_empty());

        // The stray digit on the next line is its own bad command.
        let program = assemble("LOADI R0 -\n5\n");
        assert_eq!(
            program.diagnostics.iter().map(|d| (d.line, d.message.as_str())).collect::<Vec<_>>(),
            vec![(1, "Literal expected after '-'"), (2, "Instruction expected")]
        );
        assert!(program.commands.is_empty());
    }

    #[test]
    fn test_comma_only_between_operands() {
        for source in ["PUSH ,R0\n", "LOADI ,R0 5\n", "ADD ,R0 R1\n", "STORE8 ,R0 R1\n"].iter() {
            let program = assemble(source);
            assert_eq!(program.error_count(), 1, "{}", source);
            assert!(program.commands.is_empty());
        }
        let program = assemble("ADD R0, R1\nSTORE8 R0, R1\nLOADI R0, 5\n");
        assert_eq!(program.error_count(), 0);
        assert_eq!(program.commands.len(), 3);
    }

    #[test]
    fn test_label_out_of_immediate_range() {
        let mut source = String::from("LOADI R0 far\n");
        for _ in 0..256 {
            source.push_str("PUSH R0\n");
        }
        source.push_str("far: POP R0\n");
        let program = assemble(&source);
        assert_eq!(program.labels["far"], 257);
        assert_eq!(messages(&program), vec!["Symbol 'far' resolves to 257, which does not fit in 8 bits"]);
    }

    #[test]
    fn test_comments_and_blank_input() {
        assert_eq!(assemble("").error_count(), 0);
        assert_eq!(assemble("   \n\n# only a comment").commands.len(), 0);
        let program = assemble("# header\nPUSH R0 # push\n\n# trailer");
        assert_eq!(program.error_count(), 0);
        assert_eq!(program.commands.len(), 1);
        assert_eq!(program.commands[0].offset, 9);
    }

    #[test]
    fn test_listing_reassembles() {
        let source = "top: LOAD16 R1 R2\nMOVE R0O ~R3O\nJUMP IF C R1\nSTACK_INIT R2O\nRETURN 2\nIN R1O\nSBB R3O R2\nLOADI R0 top\n";
        let program = assemble(source);
        assert_eq!(program.error_count(), 0);
        let listing: String = program
            .commands
            .iter()
            .map(|c| format!("{}\n", c.operation))
            .collect();
        let again = assemble(&listing);
        assert_eq!(again.error_count(), 0);
        assert_eq!(operations(&again), operations(&program));
    }
}
