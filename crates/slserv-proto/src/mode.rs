//! Channel mode handling.
//!
//! A channel's binary modes are plain bool fields (the same shape the
//! daemon uses for user flags); key and limit ride alongside. The parser
//! walks a mode string left to right, toggling the add/remove sign on
//! `+`/`-` and consuming positional parameters with bounds checking; a
//! mode character that needs a parameter when none remains is reported,
//! not fatal.

/// Binary channel modes plus key and limit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelModes {
    pub invite_only: bool,     // +i
    pub moderated: bool,       // +m
    pub no_external: bool,     // +n
    pub private: bool,         // +p
    pub secret: bool,          // +s
    pub topic_protected: bool, // +t
    pub key: Option<String>,   // +k
    pub limit: Option<u32>,    // +l
}

impl ChannelModes {
    /// Convert modes to a display string like `+ntk sekrit`.
    ///
    /// Parameters (key, limit) follow the letters in the order the
    /// letters appear.
    pub fn as_mode_string(&self) -> String {
        let mut letters = String::from("+");
        let mut params: Vec<String> = Vec::new();
        if self.invite_only {
            letters.push('i');
        }
        if self.moderated {
            letters.push('m');
        }
        if self.no_external {
            letters.push('n');
        }
        if self.private {
            letters.push('p');
        }
        if self.secret {
            letters.push('s');
        }
        if self.topic_protected {
            letters.push('t');
        }
        if let Some(key) = &self.key {
            letters.push('k');
            params.push(key.clone());
        }
        if let Some(limit) = self.limit {
            letters.push('l');
            params.push(limit.to_string());
        }
        if params.is_empty() {
            letters
        } else {
            format!("{} {}", letters, params.join(" "))
        }
    }

    /// Apply a single flag toggle by character. Returns false for a
    /// character this struct does not track.
    pub fn set_flag(&mut self, flag: char, on: bool) -> bool {
        match flag {
            'i' => self.invite_only = on,
            'm' => self.moderated = on,
            'n' => self.no_external = on,
            'p' => self.private = on,
            's' => self.secret = on,
            't' => self.topic_protected = on,
            _ => return false,
        }
        true
    }

    /// Read a single flag by character.
    pub fn flag(&self, flag: char) -> bool {
        match flag {
            'i' => self.invite_only,
            'm' => self.moderated,
            'n' => self.no_external,
            'p' => self.private,
            's' => self.secret,
            't' => self.topic_protected,
            _ => false,
        }
    }

    /// The binary flag characters this struct tracks.
    pub const FLAG_CHARS: [char; 6] = ['i', 'm', 'n', 'p', 's', 't'];
}

/// One decoded element of a MODE command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChange {
    /// A binary flag such as `+n` or `-t`.
    Flag { adding: bool, flag: char },
    /// `+k key` / `-k [key]`.
    Key { adding: bool, key: Option<String> },
    /// `+l n` / `-l`.
    Limit { adding: bool, limit: Option<u32> },
    /// `+b mask` / `-b mask`.
    Ban { adding: bool, mask: String },
    /// `+o nick` / `-o nick`.
    Op { adding: bool, nick: String },
    /// `+v nick` / `-v nick`.
    Voice { adding: bool, nick: String },
}

/// Result of walking a mode string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModeParse {
    pub changes: Vec<ModeChange>,
    /// Mode characters that required a parameter none was left for.
    pub missing_param: Vec<char>,
    /// Mode characters the daemon does not track.
    pub unknown: Vec<char>,
}

/// Walk a mode string left to right.
///
/// `args` are the positional parameters following the mode string in the
/// MODE command. `-k` consumes a parameter when one is present (servers
/// differ on whether they send it); `-l` never consumes one.
pub fn parse_channel_modes(mode_str: &str, args: &[String]) -> ModeParse {
    let mut out = ModeParse::default();
    let mut adding = true;
    let mut next_arg = 0usize;

    let mut take_arg = |next_arg: &mut usize| -> Option<String> {
        let arg = args.get(*next_arg).cloned();
        if arg.is_some() {
            *next_arg += 1;
        }
        arg
    };

    for ch in mode_str.chars() {
        match ch {
            '+' => adding = true,
            '-' => adding = false,
            'i' | 'm' | 'n' | 'p' | 's' | 't' => {
                out.changes.push(ModeChange::Flag { adding, flag: ch });
            }
            'k' => {
                let key = take_arg(&mut next_arg);
                if adding && key.is_none() {
                    out.missing_param.push('k');
                } else {
                    out.changes.push(ModeChange::Key { adding, key });
                }
            }
            'l' => {
                if adding {
                    match take_arg(&mut next_arg).and_then(|a| a.parse::<u32>().ok()) {
                        Some(limit) => out.changes.push(ModeChange::Limit {
                            adding,
                            limit: Some(limit),
                        }),
                        None => out.missing_param.push('l'),
                    }
                } else {
                    out.changes.push(ModeChange::Limit {
                        adding,
                        limit: None,
                    });
                }
            }
            'b' => match take_arg(&mut next_arg) {
                Some(mask) => out.changes.push(ModeChange::Ban { adding, mask }),
                None => out.missing_param.push('b'),
            },
            'o' => match take_arg(&mut next_arg) {
                Some(nick) => out.changes.push(ModeChange::Op { adding, nick }),
                None => out.missing_param.push('o'),
            },
            'v' => match take_arg(&mut next_arg) {
                Some(nick) => out.changes.push(ModeChange::Voice { adding, nick }),
                None => out.missing_param.push('v'),
            },
            _ => out.unknown.push(ch),
        }
    }

    out
}

/// Accumulates a single MODE line correcting many differences at once.
///
/// Mode-lock reconciliation must emit exactly one outbound line per
/// reconciliation pass, so changes are collected and rendered together.
#[derive(Debug, Default, Clone)]
pub struct ModeLineBuilder {
    plus: String,
    minus: String,
    params: Vec<String>,
}

impl ModeLineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.plus.is_empty() && self.minus.is_empty()
    }

    pub fn add_flag(&mut self, flag: char) -> &mut Self {
        self.plus.push(flag);
        self
    }

    pub fn remove_flag(&mut self, flag: char) -> &mut Self {
        self.minus.push(flag);
        self
    }

    pub fn add_param(&mut self, flag: char, param: &str) -> &mut Self {
        self.plus.push(flag);
        self.params.push(param.to_owned());
        self
    }

    pub fn remove_param(&mut self, flag: char, param: &str) -> &mut Self {
        self.minus.push(flag);
        self.params.push(param.to_owned());
        self
    }

    /// Render as `+ab-cd param1 param2`, or `None` when nothing was
    /// collected. Parameters appear in insertion order, which matches
    /// the order of their letters across the two signs (`+` first).
    pub fn render(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut s = String::new();
        if !self.plus.is_empty() {
            s.push('+');
            s.push_str(&self.plus);
        }
        if !self.minus.is_empty() {
            s.push('-');
            s.push_str(&self.minus);
        }
        for p in &self.params {
            s.push(' ');
            s.push_str(p);
        }
        Some(s)
    }
}
