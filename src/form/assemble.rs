//! Context assembly — finished answers to the flat string map a template
//! renderer consumes.
//!
//! Pass 1 blank-fills every answer key. Derived values are then computed
//! from the pass-1 output, and pass 2 re-blanks any derived value that came
//! out empty. Every key returned by [`ContextAssembler::template_keys`] is
//! present in the result.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::layout::{pack_names, wrap_lines};
use super::numerals::{NumberSpeller, group_digits};
use super::schema::{DOC_CERT, DOC_EGRN, FieldKind, FormSchema, ListVariant};
use super::session::{Answer, Answers};
use super::validators::{Validator, is_skip_sentinel, parse_money};

/// Flat key → value map handed to the renderer.
pub type Context = BTreeMap<String, String>;

pub const DOCUMENT_NAME_KEY: &str = "name_of_document";
pub const DOCUMENT_VALUE_KEY: &str = "document_value";

const EGRN_LABEL: &str = "Выписка из ЕГРН,";
const CERT_LABEL: &str = "Свидетельство о государственной регистрации права,";

const DEFAULT_BLANK_WIDTH: usize = 20;
const NAMES_LINE1_MAX: usize = 60;
const NAMES_LINE2_MAX: usize = 97;

/// Underscore runs substituted for blank values in the fixed-layout lease.
const BLANK_WIDTHS: &[(&str, usize)] = &[
    ("contract_number", 5),
    ("naim_name", 98),
    ("naim_address", 101),
    ("naim_passport_series", 6),
    ("naim_passport_number", 9),
    ("naim_passport_issued_by", 93),
    ("naim_passport_issued_date", 17),
    ("ar_name", 94),
    ("ar_address", 100),
    ("ar_passport_series", 6),
    ("ar_passport_number", 9),
    ("ar_passport_issued_by", 93),
    ("ar_passport_issued_date", 17),
    ("obj_address", 80),
    ("obj_street", 27),
    ("obj_house", 6),
    ("obj_rooms", 7),
    ("obj_area", 16),
    ("obj_kadastr", 50),
    ("obj_tenants", 97),
    ("obj_tenants_line1", NAMES_LINE1_MAX),
    ("obj_animals", 62),
    ("obj_smoking", 60),
    ("rent_start", 34),
    ("monthly_payment", 18),
    ("deposit_date", 17),
    ("deposit_amount", 18),
    ("monthly_due_day", 4),
    ("payment_utilities", 93),
    ("payment_internet", 64),
    ("payment_electricity", 64),
    ("payment_water", 63),
    ("payment_repair", 63),
    ("additional_conditions", 540),
    ("act_date", 17),
    ("act_condition", 115),
    ("act_keys", 9),
    ("act_electricity", 25),
    ("act_hot_water", 23),
    ("act_cold_water", 23),
    (DOCUMENT_NAME_KEY, 50),
    (DOCUMENT_VALUE_KEY, 50),
];

/// Keys that blank to the empty string instead of underscores.
const EMPTY_WHEN_BLANK: &[&str] = &["obj_building", "obj_flat", "obj_tenants_line2"];

/// A text answer reflowed into fixed rows `{key}_1` ..= `{key}_{rows}`.
struct Reflow {
    key: &'static str,
    rows: usize,
    budget: usize,
    numbered: bool,
}

const REFLOWS: &[Reflow] = &[
    Reflow {
        key: "additional_conditions",
        rows: 6,
        budget: 90,
        numbered: true,
    },
    Reflow {
        key: "act_condition",
        rows: 2,
        budget: 115,
        numbered: false,
    },
];

static ITEM_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*").expect("item number pattern is valid"));

/// The blank value for `key`.
pub fn blank_value(key: &str) -> String {
    if EMPTY_WHEN_BLANK.contains(&key) {
        return String::new();
    }
    let width = BLANK_WIDTHS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(DEFAULT_BLANK_WIDTH, |(_, w)| *w);
    "_".repeat(width)
}

/// Meaningful text of an answer, or `None` when it should be blanked.
fn present(answer: Option<&Answer>) -> Option<String> {
    match answer? {
        Answer::Text(s) if !s.trim().is_empty() && !is_skip_sentinel(s) => Some(s.clone()),
        Answer::List(items) if !items.is_empty() => Some(items.join(", ")),
        _ => None,
    }
}

/// Builds the render context from a session's answers.
#[derive(Clone)]
pub struct ContextAssembler {
    schema: Arc<FormSchema>,
    speller: Arc<dyn NumberSpeller>,
    renames: BTreeMap<String, String>,
}

impl ContextAssembler {
    pub fn new(schema: Arc<FormSchema>, speller: Arc<dyn NumberSpeller>) -> Self {
        Self {
            schema,
            speller,
            renames: BTreeMap::new(),
        }
    }

    /// Rename output keys (`from` → `to`) after assembly.
    pub fn with_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.renames = renames;
        self
    }

    fn money_keys(&self) -> impl Iterator<Item = &str> {
        self.schema
            .fields()
            .iter()
            .filter(|f| f.validator == Some(Validator::Money))
            .map(|f| f.key.as_str())
    }

    fn name_list_keys(&self) -> impl Iterator<Item = &str> {
        self.schema
            .fields()
            .iter()
            .filter(|f| f.kind == FieldKind::MultiValueList(ListVariant::Names))
            .map(|f| f.key.as_str())
    }

    fn reflows(&self) -> impl Iterator<Item = &'static Reflow> {
        REFLOWS
            .iter()
            .filter(|r| self.schema.index_of(r.key).is_some())
    }

    /// Keys derived from answers, subject to pass-2 re-blanking.
    fn derived_keys(&self) -> Vec<String> {
        let mut keys = vec![DOCUMENT_NAME_KEY.to_string(), DOCUMENT_VALUE_KEY.to_string()];
        for key in self.money_keys() {
            keys.push(format!("{key}_num"));
            keys.push(format!("{key}_words"));
        }
        for key in self.name_list_keys() {
            keys.push(format!("{key}_line1"));
            keys.push(format!("{key}_line2"));
        }
        keys
    }

    /// Every key the assembled context is guaranteed to hold, before renames.
    pub fn template_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.schema.answer_keys().into_iter().collect();
        keys.extend(self.derived_keys());
        for reflow in self.reflows() {
            keys.extend((1..=reflow.rows).map(|i| format!("{}_{i}", reflow.key)));
        }
        keys
    }

    pub fn assemble(&self, answers: &Answers) -> Context {
        // pass 1
        let mut ctx: Context = self
            .schema
            .answer_keys()
            .into_iter()
            .chain(answers.keys().cloned())
            .map(|key| {
                let value = present(answers.get(&key)).unwrap_or_else(|| blank_value(&key));
                (key, value)
            })
            .collect();

        self.document_reference(answers, &mut ctx);
        self.money(answers, &mut ctx);
        self.names(answers, &mut ctx);

        // pass 2
        for key in self.derived_keys() {
            let blank = ctx.get(&key).is_none_or(|v| v.is_empty());
            if blank {
                ctx.insert(key.clone(), blank_value(&key));
            }
        }

        // reflowed rows keep their own blanking: trailing rows stay empty
        for reflow in self.reflows() {
            self.reflow(reflow, answers, &mut ctx);
        }

        for (from, to) in &self.renames {
            if let Some(value) = ctx.remove(from) {
                ctx.insert(to.clone(), value);
            }
        }
        ctx
    }

    fn document_reference(&self, answers: &Answers, ctx: &mut Context) {
        let pick = |key: &str| ctx.get(key).cloned().unwrap_or_else(|| blank_value(key));
        let (name, value) = match answers.get("doc_choice").and_then(Answer::as_text) {
            Some(DOC_EGRN) => (EGRN_LABEL.to_string(), pick("obj_kadastr")),
            Some(DOC_CERT) => (
                CERT_LABEL.to_string(),
                format!("серия {} № {}", pick("cert_series"), pick("cert_number")),
            ),
            _ => (String::new(), String::new()),
        };
        ctx.insert(DOCUMENT_NAME_KEY.to_string(), name);
        ctx.insert(DOCUMENT_VALUE_KEY.to_string(), value);
    }

    fn money(&self, answers: &Answers, ctx: &mut Context) {
        let keys: Vec<String> = self.money_keys().map(str::to_string).collect();
        for key in keys {
            let amount = present(answers.get(&key)).and_then(|raw| parse_money(&raw).ok());
            let (num, words) = match amount {
                Some(n) => (group_digits(n), self.speller.spell(n)),
                None => (String::new(), String::new()),
            };
            if !num.is_empty() {
                ctx.insert(key.clone(), format!("{num} ({words})"));
            }
            ctx.insert(format!("{key}_num"), num);
            ctx.insert(format!("{key}_words"), words);
        }
    }

    fn names(&self, answers: &Answers, ctx: &mut Context) {
        let keys: Vec<String> = self.name_list_keys().map(str::to_string).collect();
        for key in keys {
            let names = match answers.get(&key) {
                Some(Answer::List(items)) => items.clone(),
                Some(Answer::Text(s)) if !is_skip_sentinel(s) => vec![s.clone()],
                _ => Vec::new(),
            };
            let (line1, line2) = pack_names(&names, NAMES_LINE1_MAX, NAMES_LINE2_MAX);
            ctx.insert(format!("{key}_line1"), line1);
            ctx.insert(format!("{key}_line2"), line2);
        }
    }

    fn reflow(&self, reflow: &Reflow, answers: &Answers, ctx: &mut Context) {
        let rows = match present(answers.get(reflow.key)) {
            Some(text) => {
                let items: Vec<String> = text
                    .lines()
                    .map(|line| ITEM_NUMBER_RE.replace(line, "").into_owned())
                    .collect();
                wrap_lines(items.as_slice(), reflow.rows, reflow.budget, reflow.numbered)
            }
            None => {
                let filled = blank_value(reflow.key).len().div_ceil(reflow.budget);
                (0..reflow.rows)
                    .map(|i| {
                        if i < filled {
                            "_".repeat(reflow.budget)
                        } else {
                            String::new()
                        }
                    })
                    .collect()
            }
        };
        for (i, row) in rows.into_iter().enumerate() {
            ctx.insert(format!("{}_{}", reflow.key, i + 1), row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::numerals::RussianSpeller;

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(Arc::new(FormSchema::lease()), Arc::new(RussianSpeller))
    }

    fn answers(pairs: &[(&str, Answer)]) -> Answers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn every_template_key_has_a_value() {
        let assembler = assembler();
        for input in [Answers::new(), answers(&[("doc_choice", Answer::text("cert"))])] {
            let ctx = assembler.assemble(&input);
            for key in assembler.template_keys() {
                assert!(ctx.contains_key(&key), "missing {key}");
            }
        }
    }

    #[test]
    fn assembly_is_idempotent() {
        let assembler = assembler();
        let input = answers(&[
            ("monthly_payment", Answer::text("47000")),
            ("obj_flat", Answer::Blank),
        ]);
        assert_eq!(assembler.assemble(&input), assembler.assemble(&input));
    }

    #[test]
    fn blanks_follow_width_table() {
        let ctx = assembler().assemble(&answers(&[
            ("contract_number", Answer::Blank),
            ("obj_flat", Answer::Blank),
        ]));
        assert_eq!(ctx["contract_number"], "_____");
        assert_eq!(ctx["obj_flat"], "");
        assert_eq!(ctx["obj_building"], "");
        assert_eq!(ctx["cert_series"], "_".repeat(DEFAULT_BLANK_WIDTH));
    }

    #[test]
    fn certificate_reference() {
        let ctx = assembler().assemble(&answers(&[
            ("doc_choice", Answer::text("cert")),
            ("cert_series", Answer::text("АБ")),
            ("cert_number", Answer::text("123456")),
        ]));
        assert_eq!(ctx[DOCUMENT_NAME_KEY], CERT_LABEL);
        assert_eq!(ctx[DOCUMENT_VALUE_KEY], "серия АБ № 123456");
    }

    #[test]
    fn registry_extract_reference_uses_kadastr() {
        let ctx = assembler().assemble(&answers(&[
            ("doc_choice", Answer::text("egrn")),
            ("obj_kadastr", Answer::text("78:12:0000000:1234")),
        ]));
        assert_eq!(ctx[DOCUMENT_NAME_KEY], EGRN_LABEL);
        assert_eq!(ctx[DOCUMENT_VALUE_KEY], "78:12:0000000:1234");
    }

    #[test]
    fn skipped_document_reference_is_reblanked() {
        let ctx = assembler().assemble(&answers(&[("doc_choice", Answer::text("skip"))]));
        assert_eq!(ctx[DOCUMENT_NAME_KEY], "_".repeat(50));
        assert_eq!(ctx[DOCUMENT_VALUE_KEY], "_".repeat(50));
    }

    #[test]
    fn money_is_grouped_and_spelled() {
        let ctx = assembler().assemble(&answers(&[("monthly_payment", Answer::text("47000"))]));
        assert_eq!(ctx["monthly_payment"], "47 000 (сорок семь тысяч)");
        assert_eq!(ctx["monthly_payment_num"], "47 000");
        assert_eq!(ctx["monthly_payment_words"], "сорок семь тысяч");
        assert_eq!(ctx["deposit_amount"], "_".repeat(18));
    }

    #[test]
    fn tenants_are_joined_and_packed() {
        let ctx = assembler().assemble(&answers(&[(
            "obj_tenants",
            Answer::List(vec!["Петров Пётр".into(), "Сидорова Анна".into()]),
        )]));
        assert_eq!(ctx["obj_tenants"], "Петров Пётр, Сидорова Анна");
        assert_eq!(ctx["obj_tenants_line1"], "Петров Пётр, Сидорова Анна");
        assert_eq!(ctx["obj_tenants_line2"], "");
    }

    #[test]
    fn conditions_are_reflowed_into_rows() {
        let ctx = assembler().assemble(&answers(&[(
            "additional_conditions",
            Answer::text("1. Без шума после 23:00\n2. Уборка раз в неделю"),
        )]));
        assert_eq!(ctx["additional_conditions_1"], "1. Без шума после 23:00");
        assert_eq!(ctx["additional_conditions_2"], "2. Уборка раз в неделю");
        assert_eq!(ctx["additional_conditions_6"], "");
    }

    #[test]
    fn multi_line_clause_is_numbered_once() {
        use crate::form::list::{ListCollector, ListStep};

        let collector = ListCollector::new(ListVariant::Clauses);
        let mut buf = Vec::new();
        collector.accept(&mut buf, "Первый пункт\nпродолжение первого").unwrap();
        collector.accept(&mut buf, "Второй пункт").unwrap();
        let Ok(ListStep::Finished(answer)) = collector.accept(&mut buf, "-") else {
            panic!("list did not finish");
        };

        let ctx = assembler().assemble(&answers(&[("additional_conditions", answer)]));
        assert_eq!(
            ctx["additional_conditions_1"],
            "1. Первый пункт продолжение первого"
        );
        assert_eq!(ctx["additional_conditions_2"], "2. Второй пункт");
        assert_eq!(ctx["additional_conditions_3"], "");
    }

    #[test]
    fn blank_conditions_fill_underscore_rows() {
        let ctx = assembler().assemble(&Answers::new());
        for i in 1..=6 {
            assert_eq!(ctx[&format!("additional_conditions_{i}")], "_".repeat(90));
        }
        assert_eq!(ctx["act_condition_1"], "_".repeat(115));
        assert_eq!(ctx["act_condition_2"], "");
    }

    #[test]
    fn renames_apply_to_output_keys() {
        let mut renames = BTreeMap::new();
        renames.insert("contract_number".to_string(), "number".to_string());
        let ctx = assembler()
            .with_renames(renames)
            .assemble(&answers(&[("contract_number", Answer::text("А123"))]));
        assert_eq!(ctx["number"], "А123");
        assert!(!ctx.contains_key("contract_number"));
    }
}
