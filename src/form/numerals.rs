//! Numbers in words, and digit grouping for amounts.

/// Separator inserted between digit groups.
pub const GROUP_SEPARATOR: char = ' ';

/// Spells a non-negative integer as a cardinal number in words.
pub trait NumberSpeller: Send + Sync {
    fn spell(&self, n: u64) -> String;
}

const UNITS_MASCULINE: [&str; 10] = [
    "", "один", "два", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];
const UNITS_FEMININE: [&str; 10] = [
    "", "одна", "две", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];
const TEENS: [&str; 10] = [
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];
const TENS: [&str; 10] = [
    "", "", "двадцать", "тридцать", "сорок", "пятьдесят", "шестьдесят", "семьдесят", "восемьдесят",
    "девяносто",
];
const HUNDREDS: [&str; 10] = [
    "", "сто", "двести", "триста", "четыреста", "пятьсот", "шестьсот", "семьсот", "восемьсот",
    "девятьсот",
];

/// Scale words for each power of a thousand, with the gender of its units.
const SCALES: [([&str; 3], bool); 6] = [
    (["тысяча", "тысячи", "тысяч"], true),
    (["миллион", "миллиона", "миллионов"], false),
    (["миллиард", "миллиарда", "миллиардов"], false),
    (["триллион", "триллиона", "триллионов"], false),
    (["квадриллион", "квадриллиона", "квадриллионов"], false),
    (["квинтиллион", "квинтиллиона", "квинтиллионов"], false),
];

/// Russian cardinal numerals in the nominative case.
#[derive(Debug, Clone, Copy, Default)]
pub struct RussianSpeller;

impl RussianSpeller {
    /// Words for 1..=999. Empty for zero.
    fn triad(n: u64, feminine: bool) -> Vec<&'static str> {
        let units = if feminine {
            &UNITS_FEMININE
        } else {
            &UNITS_MASCULINE
        };
        let mut words = Vec::with_capacity(3);
        let (h, rest) = ((n / 100) as usize, (n % 100) as usize);
        if h > 0 {
            words.push(HUNDREDS[h]);
        }
        match rest {
            0 => {}
            10..=19 => words.push(TEENS[rest - 10]),
            _ => {
                if rest >= 20 {
                    words.push(TENS[rest / 10]);
                }
                if rest % 10 > 0 {
                    words.push(units[rest % 10]);
                }
            }
        }
        words
    }

    /// Pick the form agreeing with `n`: one / few / many.
    fn plural<'a>(n: u64, forms: &[&'a str; 3]) -> &'a str {
        match (n % 10, n % 100) {
            (_, 11..=14) => forms[2],
            (1, _) => forms[0],
            (2..=4, _) => forms[1],
            _ => forms[2],
        }
    }
}

impl NumberSpeller for RussianSpeller {
    fn spell(&self, n: u64) -> String {
        if n == 0 {
            return "ноль".to_string();
        }

        let mut groups = Vec::new();
        let mut rest = n;
        while rest > 0 {
            groups.push(rest % 1000);
            rest /= 1000;
        }

        let mut words: Vec<&str> = Vec::new();
        for (power, &group) in groups.iter().enumerate().rev() {
            if group == 0 {
                continue;
            }
            match power.checked_sub(1).map(|i| SCALES[i]) {
                None => words.extend(Self::triad(group, false)),
                Some((forms, feminine)) => {
                    words.extend(Self::triad(group, feminine));
                    words.push(Self::plural(group, &forms));
                }
            }
        }
        words.join(" ")
    }
}

/// `47000` → `"47 000"`.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(c);
    }
    out
}
