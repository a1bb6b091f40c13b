// Copyright (c) 2026 rezky_nightky

//! Read-only dossier and note tables.

use crate::error::LookupError;
use crate::runtime::ColorToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectStatus {
    Active,
    Dead,
    Anomaly,
    LostContact,
    Unknown,
}

impl SubjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            SubjectStatus::Active => "АКТИВЕН",
            SubjectStatus::Dead => "МЁРТВ",
            SubjectStatus::Anomaly => "АНОМАЛИЯ",
            SubjectStatus::LostContact => "СВЯЗЬ ОТСУТСТВУЕТ",
            SubjectStatus::Unknown => "НЕИЗВЕСТНО",
        }
    }

    pub fn color(self) -> ColorToken {
        match self {
            SubjectStatus::Active => ColorToken::Normal,
            SubjectStatus::Dead => ColorToken::Red,
            SubjectStatus::Anomaly => ColorToken::Magenta,
            SubjectStatus::LostContact => ColorToken::Yellow,
            SubjectStatus::Unknown => ColorToken::Dim,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AudioRef {
    /// File stem under the `dossiers` audio category.
    pub file: &'static str,
    pub description: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct Dossier {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub status: SubjectStatus,
    pub outcome: &'static [&'static str],
    pub report: &'static [&'static str],
    pub missions: &'static str,
    pub audio: Option<AudioRef>,
}

#[derive(Clone, Copy, Debug)]
pub struct Note {
    pub id: &'static str,
    pub title: &'static str,
    pub author: &'static str,
    pub content: &'static [&'static str],
}

/// Notes that always open cleanly.
pub const SAFE_NOTES: &[&str] = &["NOTE_001", "NOTE_004"];

static DOSSIERS: &[Dossier] = &[
    Dossier {
        id: "0x001",
        name: "ERICH VAN KOSS",
        role: "Руководитель экспедиции",
        status: SubjectStatus::LostContact,
        outcome: &[
            "Последний сигнал получен с глубины 3 200 м.",
            "Маяк продолжает передавать. Пульс не фиксируется.",
        ],
        report: &[
            "Субъект вошёл в сектор 7 без сопровождения.",
            "Камеры зафиксировали вторую фигуру за его спиной.",
            "Вторая фигура не отображается на тепловизоре.",
        ],
        missions: "MARINER-7, SILENT ORBIT, ХРОНОС",
        audio: Some(AudioRef {
            file: "0x001_final_transmission",
            description: "Последняя передача: шум, дыхание, фраза на неизвестном языке.",
        }),
    },
    Dossier {
        id: "0x004",
        name: "JOHAN OLSSON",
        role: "Инженер систем жизнеобеспечения",
        status: SubjectStatus::Dead,
        outcome: &["Тело обнаружено в шлюзе B. Шлюз был заперт изнутри."],
        report: &[
            "За 48 часов до смерти жаловался на голоса в вентиляции.",
            "Записал в журнал одну строку 112 раз подряд.",
        ],
        missions: "MARINER-7",
        audio: None,
    },
    Dossier {
        id: "0x009",
        name: "ANNA-MARIE KOWALSKA",
        role: "Биолог",
        status: SubjectStatus::Anomaly,
        outcome: &[
            "Биометрия не совпадает с эталонной.",
            "Субъект утверждает, что никогда не покидала станцию.",
        ],
        report: &[
            "Образцы из сектора 7 исчезли из хранилища.",
            "Субъект улыбается на всех записях. Даже во сне.",
        ],
        missions: "MARINER-7, ГЛУБИНА",
        audio: Some(AudioRef {
            file: "0x009_interview",
            description: "Запись допроса. На 04:12 субъект начинает отвечать до вопросов.",
        }),
    },
    Dossier {
        id: "0x013",
        name: "RAUL SEVERIN",
        role: "Связист",
        status: SubjectStatus::Active,
        outcome: &["Продолжает выходить на связь по расписанию."],
        report: &[
            "Сообщения приходят с опозданием в 19 минут.",
            "Станция связи была демонтирована три недели назад.",
        ],
        missions: "SILENT ORBIT",
        audio: None,
    },
    Dossier {
        id: "0x022",
        name: "[ДАННЫЕ УДАЛЕНЫ]",
        role: "[ДАННЫЕ УДАЛЕНЫ]",
        status: SubjectStatus::Unknown,
        outcome: &["Запись удалена пользователем с уровнем доступа 0."],
        report: &["Уровня доступа 0 не существует."],
        missions: "—",
        audio: None,
    },
    Dossier {
        id: "0x047",
        name: "ADAM",
        role: "Оператор терминала",
        status: SubjectStatus::Active,
        outcome: &["Субъект читает это прямо сейчас."],
        report: &[
            "Субъект открыл архив в нарушение протокола.",
            "Рекомендация: не прерывать наблюдение.",
        ],
        missions: "ТЕКУЩАЯ",
        audio: None,
    },
];

static NOTES: &[Note] = &[
    Note {
        id: "NOTE_001",
        title: "ВЫ НЕ ДОЛЖНЫ ЭТО ВИДЕТЬ",
        author: "неизвестен",
        content: &[
            "Если вы читаете это, значит, архив снова открыт.",
            "Не отвечайте, если терминал начнёт печатать сам.",
            "Не называйте своё имя. Оно уже знает его.",
            "Выключите питание до того, как индикатор дойдёт до красного.",
        ],
    },
    Note {
        id: "NOTE_002",
        title: "ОТЧЁТ О СМЕНЕ 14",
        author: "J. Olsson",
        content: &[
            "Давление в секторе 7 снова растёт без причины.",
            "Слышу стук в переборку. Ритм совпадает с моим пульсом.",
            "Ван Косс сказал, что это нормально. Ван Косс уже неделю не выходил из каюты.",
        ],
    },
    Note {
        id: "NOTE_003",
        title: "ГОЛОС В КАНАЛЕ 3",
        author: "R. Severin",
        content: &[
            "Канал 3 отключён физически. Кабель перерезан.",
            "Вчера по нему передали мой собственный голос.",
            "Он назвал время. Сейчас 03:14. Осталось семь минут.",
        ],
    },
    Note {
        id: "NOTE_004",
        title: "ИНСТРУКЦИЯ ПО ПЕРЕЗАГРУЗКЕ",
        author: "служба поддержки",
        content: &[
            "При нестабильной работе выполните команду reset.",
            "Подтвердите операцию клавишей Y.",
            "Не покидайте терминал во время перезагрузки.",
        ],
    },
    Note {
        id: "NOTE_005",
        title: "ОНО ЗНАЕТ ИМЯ",
        author: "A. Kowalska",
        content: &[
            "Я больше не уверена, что вернулась одна.",
            "В отражении я моргаю позже.",
            "Если встретите меня, спросите, что было в секторе 7. Я не помню. Она помнит.",
        ],
    },
];

pub fn dossiers() -> &'static [Dossier] {
    DOSSIERS
}

pub fn notes() -> &'static [Note] {
    NOTES
}

pub fn dossier(id: &str) -> Result<&'static Dossier, LookupError> {
    let key = id.trim().to_uppercase();
    DOSSIERS
        .iter()
        .find(|d| d.id.to_uppercase() == key)
        .ok_or_else(|| LookupError::SubjectNotFound(key))
}

pub fn note(id: &str) -> Result<&'static Note, LookupError> {
    let key = id.trim().to_uppercase();
    NOTES
        .iter()
        .find(|n| n.id == key)
        .ok_or_else(|| LookupError::NoteNotFound(key))
}

pub fn is_safe_note(id: &str) -> bool {
    SAFE_NOTES.contains(&id)
}
