//! Field schema — the ordered, immutable list of questions.

use serde::{Deserialize, Serialize};

use super::validators::Validator;

/// A discrete choice presented as an inline widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Tag carried by the choice event.
    pub tag: &'static str,
    /// Button label.
    pub label: &'static str,
    /// Value stored under the field key when picked.
    pub value: &'static str,
}

pub const DOC_EGRN: &str = "egrn";
pub const DOC_CERT: &str = "cert";
pub const DOC_SKIP: &str = "skip";
pub const ACT_NO: &str = "Нет";

/// Preset text for the act condition button.
pub const DEFAULT_ACT_CONDITION: &str =
    "Всё оборудование, мебель, техника и системы исправны и находятся в хорошем и рабочем состоянии.";

const PAYER_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "наниматель",
        label: "Наниматель",
        value: "Наниматель",
    },
    ChoiceOption {
        tag: "наймодатель",
        label: "Наймодатель",
        value: "Наймодатель",
    },
];

const PERMISSION_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "разрешено",
        label: "Разрешено",
        value: "Разрешено",
    },
    ChoiceOption {
        tag: "запрещено",
        label: "Запрещено",
        value: "Запрещено",
    },
];

const DOCUMENT_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "doc_egrn",
        label: "ЕГРН",
        value: DOC_EGRN,
    },
    ChoiceOption {
        tag: "doc_cert",
        label: "Свидетельство",
        value: DOC_CERT,
    },
    ChoiceOption {
        tag: "skip_doc",
        label: "Пропустить",
        value: DOC_SKIP,
    },
];

const MAKE_ACT_OPTIONS: &[ChoiceOption] = &[
    ChoiceOption {
        tag: "act_yes",
        label: "Да",
        value: "Да",
    },
    ChoiceOption {
        tag: "act_no",
        label: "Нет",
        value: ACT_NO,
    },
];

const ACT_CONDITION_OPTIONS: &[ChoiceOption] = &[ChoiceOption {
    tag: "default_condition",
    label: "🟢 Всё исправно…",
    value: DEFAULT_ACT_CONDITION,
}];

/// Which enumerated set an inline-choice field presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceVariant {
    Payer,
    Permission,
    DocumentRight,
    MakeAct,
    ActCondition,
}

impl ChoiceVariant {
    pub fn options(&self) -> &'static [ChoiceOption] {
        match self {
            Self::Payer => PAYER_OPTIONS,
            Self::Permission => PERMISSION_OPTIONS,
            Self::DocumentRight => DOCUMENT_OPTIONS,
            Self::MakeAct => MAKE_ACT_OPTIONS,
            Self::ActCondition => ACT_CONDITION_OPTIONS,
        }
    }

    /// Look up an option by its event tag.
    pub fn option(&self, tag: &str) -> Option<&'static ChoiceOption> {
        self.options().iter().find(|o| o.tag == tag)
    }

    /// Value stored when the skip sentinel is typed instead of picking.
    ///
    /// `None` stores a blank. Skipping the document choice means "no
    /// document", and skipping the act question means "no act".
    pub fn sentinel_value(&self) -> Option<&'static str> {
        match self {
            Self::DocumentRight => Some(DOC_SKIP),
            Self::MakeAct => Some(ACT_NO),
            Self::Payer | Self::Permission | Self::ActCondition => None,
        }
    }

    /// Whether typed text is accepted verbatim as an answer.
    pub fn accepts_free_text(&self) -> bool {
        matches!(self, Self::ActCondition)
    }
}

/// Address collection variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressVariant {
    /// Asks for the city first.
    WithCity,
    /// City is fixed; components are also stored under `{prefix}_street`,
    /// `{prefix}_house`, `{prefix}_building` and `{prefix}_flat`.
    FixedCity { city: String, aux_prefix: String },
}

impl AddressVariant {
    /// Keys written alongside the main address key.
    pub fn aux_keys(&self) -> Vec<String> {
        match self {
            Self::FixedCity { aux_prefix, .. } => ["street", "house", "building", "flat"]
                .iter()
                .map(|part| format!("{aux_prefix}_{part}"))
                .collect(),
            Self::WithCity => Vec::new(),
        }
    }
}

/// List-building variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListVariant {
    /// Free-text clauses, stored as a numbered newline-joined text.
    Clauses,
    /// Personal names, stored as the ordered list.
    Names,
}

/// Handling strategy for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    PlainText,
    InlineChoice(ChoiceVariant),
    MultiPhaseAddress(AddressVariant),
    MultiValueList(ListVariant),
}

/// One question in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub prompt: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<Validator>,
}

impl FieldSpec {
    fn new(key: &str, prompt: &str, kind: FieldKind, validator: Option<Validator>) -> Self {
        Self {
            key: key.to_string(),
            prompt: prompt.to_string(),
            kind,
            validator,
        }
    }

    fn text(key: &str, prompt: &str, validator: Validator) -> Self {
        Self::new(key, prompt, FieldKind::PlainText, Some(validator))
    }

    fn choice(key: &str, prompt: &str, variant: ChoiceVariant) -> Self {
        Self::new(key, prompt, FieldKind::InlineChoice(variant), None)
    }

    /// Auxiliary keys written alongside the main key (fixed-city addresses).
    pub fn aux_keys(&self) -> Vec<String> {
        match &self.kind {
            FieldKind::MultiPhaseAddress(variant) => variant.aux_keys(),
            _ => Vec::new(),
        }
    }
}

/// Ordered field list. Order is the canonical step order.
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Build a schema from fields. Keys must be unique.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        debug_assert!(
            {
                let mut keys: Vec<&str> = fields.iter().map(|f| f.key.as_str()).collect();
                keys.sort_unstable();
                keys.windows(2).all(|w| w[0] != w[1])
            },
            "field keys must be unique"
        );
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    /// Every key a field can write: field keys plus auxiliary keys.
    pub fn answer_keys(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|f| std::iter::once(f.key.clone()).chain(f.aux_keys()))
            .collect()
    }

    /// The residential lease contract.
    pub fn lease() -> Self {
        use ChoiceVariant::*;
        use Validator::*;

        let obj_address = FieldKind::MultiPhaseAddress(AddressVariant::FixedCity {
            city: "Санкт-Петербург".to_string(),
            aux_prefix: "obj".to_string(),
        });

        Self::new(vec![
            // Основные данные
            FieldSpec::text("contract_number", "Введите номер договора (пример: А123):", NonEmpty),
            FieldSpec::text("date", "Введите дату договора (пример: 20.03.25):", Date),
            // Наниматель
            FieldSpec::text("naim_name", "Введите ФИО нанимателя:", PersonName),
            FieldSpec::new(
                "naim_address",
                "📬 Город регистрации нанимателя (пример: Москва):",
                FieldKind::MultiPhaseAddress(AddressVariant::WithCity),
                None,
            ),
            FieldSpec::text(
                "naim_passport_series",
                "📄 Серия паспорта нанимателя (4 цифры):",
                Digits { len: 4 },
            ),
            FieldSpec::text(
                "naim_passport_number",
                "📄 Номер паспорта нанимателя (6 цифр):",
                Digits { len: 6 },
            ),
            FieldSpec::text(
                "naim_passport_issued_by",
                "📄 Кем выдан паспорт? (пример: ГУ МВД России)",
                UpperCase,
            ),
            FieldSpec::text(
                "naim_passport_issued_date",
                "📅 Когда выдан паспорт? (пример: 30.01.2020)",
                Date,
            ),
            // Наймодатель
            FieldSpec::text("ar_name", "👤 ФИО наймодателя:", PersonName),
            FieldSpec::new(
                "ar_address",
                "📬 Город регистрации наймодателя (пример: Москва):",
                FieldKind::MultiPhaseAddress(AddressVariant::WithCity),
                None,
            ),
            FieldSpec::text(
                "ar_passport_series",
                "📄 Серия паспорта наймодателя (4 цифры):",
                Digits { len: 4 },
            ),
            FieldSpec::text(
                "ar_passport_number",
                "📄 Номер паспорта наймодателя (6 цифр):",
                Digits { len: 6 },
            ),
            FieldSpec::text(
                "ar_passport_issued_by",
                "📄 Кем выдан паспорт наймодателя?",
                UpperCase,
            ),
            FieldSpec::text("ar_passport_issued_date", "📅 Когда выдан паспорт наймодателя?", Date),
            // Объект
            FieldSpec::new(
                "obj_address",
                "📍 Адрес объекта (Санкт-Петербург): укажите улицу (пример: Барочная)",
                obj_address,
                None,
            ),
            FieldSpec::text("obj_rooms", "🚪 Количество комнат:", Count),
            FieldSpec::text("obj_area", "📐 Общая площадь (кв.м):", Area),
            FieldSpec::choice(
                "doc_choice",
                "📄 Подтверждение права: выберите документ",
                DocumentRight,
            ),
            FieldSpec::text(
                "obj_kadastr",
                "📄 Кадастровый номер (пример: 00:00:0000000:0000):",
                Kadastr,
            ),
            FieldSpec::text("cert_series", "📄 Серия свидетельства:", NonEmpty),
            FieldSpec::text("cert_number", "📄 Номер свидетельства:", NonEmpty),
            FieldSpec::new(
                "obj_tenants",
                "🏡 Кто проживает с нанимателем? Введите ФИО или '-' если никого:",
                FieldKind::MultiValueList(ListVariant::Names),
                None,
            ),
            FieldSpec::choice("obj_animals", "🐕 Содержание животных разрешено?", Permission),
            FieldSpec::choice("obj_smoking", "🚬 Курение в помещении разрешено?", Permission),
            // Сроки
            FieldSpec::text("rent_start", "📅 Дата начала найма? (пример: 01.09.2025)", Date),
            FieldSpec::text("rent_end", "📅 Дата окончания найма? (пример: 01.09.2026)", Date),
            // Оплата
            FieldSpec::text(
                "monthly_payment",
                "💸 Ежемесячная плата (в рублях, пример: 30000/30 000):",
                Money,
            ),
            FieldSpec::text("deposit_date", "📆 Дата внесения обеспечительного платежа:", Date),
            FieldSpec::text(
                "deposit_amount",
                "💰 Сумма обеспечительного платежа (в рублях, пример: 30000/30 000):",
                Money,
            ),
            FieldSpec::text(
                "monthly_due_day",
                "📅 До какого числа каждого месяца должна быть произведена оплата? (пример: 15)",
                DayOfMonth,
            ),
            FieldSpec::choice("payment_utilities", "🏠 Коммунальные услуги оплачивает:", Payer),
            FieldSpec::choice("payment_internet", "🌐 Интернет оплачивает:", Payer),
            FieldSpec::choice("payment_electricity", "⚡️ Электроэнергию оплачивает:", Payer),
            FieldSpec::choice("payment_water", "🚿 ХВС/ГВС оплачивает:", Payer),
            FieldSpec::choice("payment_repair", "🔧 Капитальный ремонт оплачивает:", Payer),
            // Доп. условия
            FieldSpec::new(
                "additional_conditions",
                "✍️ Дополнительные условия (напишите пункт или '-' если нет):",
                FieldKind::MultiValueList(ListVariant::Clauses),
                None,
            ),
            // Акт приёма-передачи
            FieldSpec::choice("act_make", "📝 Делаем акт приёма-передачи?", MakeAct),
            FieldSpec::text("act_date", "📅 Дата акта приёма-передачи:", Date),
            FieldSpec::choice(
                "act_condition",
                "🏡 Состояние помещения и оборудования?\nМожно ввести текст вручную или нажать кнопку.",
                ActCondition,
            ),
            FieldSpec::text("act_keys", "🔑 Количество комплектов ключей:", PositiveCount),
            FieldSpec::text("act_electricity", "⚡️ Показания электросчётчика:", MeterReading),
            FieldSpec::text("act_hot_water", "🌡️ Показания счётчика горячей воды:", MeterReading),
            FieldSpec::text("act_cold_water", "❄️ Показания счётчика холодной воды:", MeterReading),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_keys_are_unique() {
        let schema = FormSchema::lease();
        let mut keys = schema.answer_keys();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn lease_orders_document_fields_after_choice() {
        let schema = FormSchema::lease();
        let choice = schema.index_of("doc_choice").unwrap();
        assert_eq!(schema.index_of("obj_kadastr"), Some(choice + 1));
        assert_eq!(schema.index_of("cert_series"), Some(choice + 2));
        assert_eq!(schema.index_of("cert_number"), Some(choice + 3));
    }

    #[test]
    fn fixed_city_address_exposes_aux_keys() {
        let schema = FormSchema::lease();
        let field = schema.get(schema.index_of("obj_address").unwrap()).unwrap();
        assert_eq!(
            field.aux_keys(),
            vec!["obj_street", "obj_house", "obj_building", "obj_flat"]
        );
        let naim = schema.get(schema.index_of("naim_address").unwrap()).unwrap();
        assert!(naim.aux_keys().is_empty());
    }

    #[test]
    fn choice_lookup_by_tag() {
        let opt = ChoiceVariant::DocumentRight.option("doc_cert").unwrap();
        assert_eq!(opt.value, DOC_CERT);
        assert!(ChoiceVariant::Payer.option("doc_cert").is_none());
        assert_eq!(ChoiceVariant::MakeAct.sentinel_value(), Some(ACT_NO));
        assert!(ChoiceVariant::ActCondition.accepts_free_text());
    }
}
