//! Fixed user-facing texts and button sets of the session menu.

use crate::channels::ResponseChoice;

use super::command::MenuAction;

pub const MENU: &str = "Привет!\n\nМожно прочитать инструкцию или начать заполнять договор.";

pub const INSTRUCTION: &str = "📘 Как пользоваться:\n\
1️⃣ Отвечайте на вопросы последовательно, договор соберётся сам.\n\
2️⃣ Для пропуска любого пункта введите «-» или нажмите кнопку «Пропустить».\n\
3️⃣ Чтобы вернуться к предыдущему вопросу, напишите «Назад».\n\
4️⃣ В любой момент можно написать «Скачать файл» и получить договор.\n\n\
Все данные форматируются автоматически (ФИО, даты, суммы, адреса), \
а пропущенные места заполняются подчёркиваниями.\n\n\
Начните с кнопки ниже 👇";

pub const UNFINISHED_SESSION: &str = "Обнаружена незавершённая сессия. Что делаем?";
pub const STARTED: &str = "Начинаем заполнение договора.";
pub const RESTARTED: &str = "Начинаем заново.";
pub const CONTINUED: &str = "Продолжаем с текущего шага.";
pub const ALL_COLLECTED: &str = "✅ Все данные собраны. Формирую файл...";
pub const LEASE_READY: &str = "📄 Договор готов.";
pub const FOLLOW_UP_QUESTION: &str = "Заполнить ли данные в дополнительных договорах?";
pub const FOLLOW_UPS_SKIPPED: &str = "Дополнительные договоры пропущены.";
pub const SENT_TENANT_COMMISSION: &str = "Отправлен договор: комиссия от нанимателя.";
pub const SENT_LANDLORD_COMMISSION: &str = "Отправлен договор: комиссия от наймодателя.";

pub fn render_failed(reason: &str) -> String {
    format!("Ошибка генерации файла: {reason}")
}

fn buttons(actions: &[MenuAction]) -> Vec<ResponseChoice> {
    actions
        .iter()
        .map(|a| ResponseChoice {
            tag: a.tag().to_string(),
            label: a.label().to_string(),
        })
        .collect()
}

pub fn menu_buttons() -> Vec<ResponseChoice> {
    buttons(&[MenuAction::Instruction, MenuAction::StartLease])
}

pub fn restart_buttons() -> Vec<ResponseChoice> {
    buttons(&[MenuAction::ConfirmRestart, MenuAction::Continue])
}

pub fn follow_up_buttons() -> Vec<ResponseChoice> {
    buttons(&[
        MenuAction::CommissionTenant,
        MenuAction::CommissionLandlord,
        MenuAction::SkipFollowUps,
    ])
}
