//! Handbook of processor instructions and assembler control commands.
//!
//! The data lives in embedded JSON so briefs can be revised without
//! touching code.  Pseudo-functions and pseudo-variables are few enough to
//! keep in constant tables.

use std::collections::HashMap;

const OPCODES_JSON: &str = include_str!("opcodes.json");
const CONTROLS_JSON: &str = include_str!("controls.json");

/// Operand-position functions such as `.sizeof(...)`.
pub const PSEUDO_FUNCTIONS: [(&str,&str);14] = [
    (".addrsize","address size of a symbol"),
    (".bankbyte","bank byte of the argument"),
    (".blank","true if the argument is empty"),
    (".concat","concatenate strings"),
    (".const","true if the argument is constant"),
    (".defined","true if the symbol is defined"),
    (".definedmacro","true if the macro is defined"),
    (".hibyte","high byte of the argument"),
    (".lobyte","low byte of the argument"),
    (".match","compare token lists"),
    (".sizeof","size of a scope, struct, or label"),
    (".sprintf","format a string"),
    (".strlen","length of a string"),
    (".tcount","number of tokens in the argument")
];

/// Operand-position variables.
pub const PSEUDO_VARIABLES: [(&str,&str);5] = [
    ("*","current program counter"),
    (".asize","current accumulator size"),
    (".isize","current index register size"),
    (".paramcount","number of macro parameters"),
    (".time","assembly time stamp")
];

pub struct Handbook {
    ops: HashMap<String,String>,
    controls: HashMap<String,String>
}

fn parse_briefs(json: &str) -> HashMap<String,String> {
    let mut ans = HashMap::new();
    if let Ok(root) = serde_json::from_str::<serde_json::Value>(json) {
        if let Some(obj) = root.as_object() {
            for (key,val) in obj {
                let mut brief = String::new();
                crate::lang::update_json_string(val,"brief",&mut brief);
                ans.insert(key.to_string(),brief);
            }
        }
    }
    ans
}

impl Handbook {
    pub fn new() -> Self {
        Self {
            ops: parse_briefs(OPCODES_JSON),
            controls: parse_briefs(CONTROLS_JSON)
        }
    }
    /// is this lower-case word an instruction mnemonic
    pub fn is_mnemonic(&self, lower: &str) -> bool {
        self.ops.contains_key(lower)
    }
    /// is this lower-case word (with leading dot) a control command
    pub fn is_control(&self, lower: &str) -> bool {
        self.controls.contains_key(lower)
    }
    pub fn mnemonic_brief(&self, lower: &str) -> Option<&String> {
        self.ops.get(lower)
    }
    pub fn control_brief(&self, lower: &str) -> Option<&String> {
        self.controls.get(lower)
    }
    pub fn mnemonics(&self) -> Vec<(&String,&String)> {
        let mut ans: Vec<(&String,&String)> = self.ops.iter().collect();
        ans.sort();
        ans
    }
    pub fn controls(&self) -> Vec<(&String,&String)> {
        let mut ans: Vec<(&String,&String)> = self.controls.iter().collect();
        ans.sort();
        ans
    }
}
