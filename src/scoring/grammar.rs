//! Minimal pronunciation grammars for the two probe flavours.
//!
//! A grammar is an ordered list of [`Slot`]s, always opened and closed by a
//! silence token. Every emitted token carries a positional digit ([`SlotMark`])
//! so a decoded hypothesis tells which slot produced each phone: `sil1` opens,
//! `k2` is left context, `ae3` came from the alternation, `t4` is the right
//! context (or the current phone of an insertion/deletion probe) and `sil5`
//! closes.

use std::fmt::Write as _;

use serde::Serialize;

use super::phones::PhoneSymbol;

/// Positional suffix identifying the slot a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SlotMark {
    Start,
    Left,
    Alt,
    Right,
    End,
}

impl SlotMark {
    pub fn digit(self) -> char {
        match self {
            SlotMark::Start => '1',
            SlotMark::Left => '2',
            SlotMark::Alt => '3',
            SlotMark::Right => '4',
            SlotMark::End => '5',
        }
    }

    fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(SlotMark::Start),
            '2' => Some(SlotMark::Left),
            '3' => Some(SlotMark::Alt),
            '4' => Some(SlotMark::Right),
            '5' => Some(SlotMark::End),
            _ => None,
        }
    }

    /// Slot of a decoded token such as `ae3`; `None` for unmarked tokens.
    pub fn of_token(token: &str) -> Option<Self> {
        token.chars().last().and_then(Self::from_digit)
    }
}

/// Recogniser token for `phone` in slot `mark`, e.g. `ng3`.
pub fn token(phone: PhoneSymbol, mark: SlotMark) -> String {
    let mut token = phone.token_stem();
    token.push(mark.digit());
    token
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Slot {
    /// Silence anchoring either end of the grammar.
    Boundary(SlotMark),
    Literal {
        phone: PhoneSymbol,
        mark: SlotMark,
        optional: bool,
    },
    /// Any inventory phone except `excluded`, in the alternation slot.
    Alternation {
        excluded: Vec<PhoneSymbol>,
        optional: bool,
    },
}

impl Slot {
    fn render(&self, out: &mut String) {
        match self {
            Slot::Boundary(mark) => out.push_str(&token(PhoneSymbol::Sil, *mark)),
            Slot::Literal {
                phone,
                mark,
                optional,
            } => wrap(out, *optional, |out| out.push_str(&token(*phone, *mark))),
            Slot::Alternation { excluded, optional } => wrap(out, *optional, |out| {
                let members: Vec<String> = PhoneSymbol::ALL
                    .iter()
                    .filter(|phone| !excluded.contains(phone))
                    .map(|phone| token(*phone, SlotMark::Alt))
                    .collect();
                out.push_str(&members.join(" | "));
            }),
        }
    }
}

fn wrap(out: &mut String, optional: bool, body: impl FnOnce(&mut String)) {
    if optional {
        out.push_str("[ ");
        body(out);
        out.push_str(" ]");
    } else {
        body(out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeKind {
    Substitution,
    InsertionDeletion,
}

impl ProbeKind {
    /// Grammar name registered with the decoder.
    pub fn grammar_name(self) -> &'static str {
        match self {
            ProbeKind::Substitution => "subalts",
            ProbeKind::InsertionDeletion => "insdels",
        }
    }

    fn key_prefix(self) -> &'static str {
        match self {
            ProbeKind::Substitution => "sub",
            ProbeKind::InsertionDeletion => "insdel",
        }
    }
}

/// Pronunciation network for one probe; built, decoded against once, dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    kind: ProbeKind,
    context: Vec<PhoneSymbol>,
    slots: Vec<Slot>,
}

impl Grammar {
    /// `sil1 left2? [ ALT ] right4? sil5`; context literals are omitted when
    /// they are silence since the boundary silences already cover them.
    pub fn substitution(left: PhoneSymbol, current: PhoneSymbol, right: PhoneSymbol) -> Self {
        let mut slots = vec![Slot::Boundary(SlotMark::Start)];
        if !left.is_silence() {
            slots.push(Slot::Literal {
                phone: left,
                mark: SlotMark::Left,
                optional: false,
            });
        }
        slots.push(Slot::Alternation {
            excluded: Vec::new(),
            optional: true,
        });
        if !right.is_silence() {
            slots.push(Slot::Literal {
                phone: right,
                mark: SlotMark::Right,
                optional: false,
            });
        }
        slots.push(Slot::Boundary(SlotMark::End));
        Self {
            kind: ProbeKind::Substitution,
            context: vec![left, current, right],
            slots,
        }
    }

    /// `sil1 [ left2 ] [ ALT' ] cur4? sil5` where `ALT'` leaves out both
    /// expected phones so it only matches intrusions.
    pub fn insertion_deletion(left: PhoneSymbol, current: PhoneSymbol) -> Self {
        let mut excluded = vec![left];
        if current != left {
            excluded.push(current);
        }
        let mut slots = vec![
            Slot::Boundary(SlotMark::Start),
            Slot::Literal {
                phone: left,
                mark: SlotMark::Left,
                optional: true,
            },
            Slot::Alternation {
                excluded,
                optional: true,
            },
        ];
        if !current.is_silence() {
            slots.push(Slot::Literal {
                phone: current,
                mark: SlotMark::Right,
                optional: false,
            });
        }
        slots.push(Slot::Boundary(SlotMark::End));
        Self {
            kind: ProbeKind::InsertionDeletion,
            context: vec![left, current],
            slots,
        }
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Phone under test: the middle of a triphone, the second of a diphone.
    pub fn current(&self) -> PhoneSymbol {
        self.context[1]
    }

    /// Token a substitution hypothesis must contain to confirm the current phone.
    pub fn target_token(&self) -> String {
        token(self.current(), SlotMark::Alt)
    }

    /// Stable label such as `sub:sil-k-ae` or `insdel:k-ae`.
    pub fn probe_key(&self) -> String {
        let labels: Vec<String> = self
            .context
            .iter()
            .map(|phone| phone.token_stem())
            .collect();
        format!("{}:{}", self.kind.key_prefix(), labels.join("-"))
    }

    /// Rule body, e.g. `sil1 k2 [ aa3 | ... ] ae4 sil5`.
    pub fn rule_body(&self) -> String {
        let mut out = String::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            slot.render(&mut out);
        }
        out
    }

    /// JSGF source accepted by grammar-driven recognisers.
    pub fn to_jsgf(&self) -> String {
        let mut out = String::from("#JSGF V1.0;\n");
        let _ = writeln!(out, "grammar {};", self.kind.grammar_name());
        let _ = writeln!(out, "public <alts> = {} ;", self.rule_body());
        out
    }
}
