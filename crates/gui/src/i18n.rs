use std::sync::atomic::{AtomicU8, Ordering};

use crate::state::Language;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Ru,
    En,
}

impl From<Language> for Lang {
    fn from(language: Language) -> Self {
        match language {
            Language::Ru => Lang::Ru,
            Language::En => Lang::En,
        }
    }
}

impl From<Lang> for Language {
    fn from(l: Lang) -> Self {
        match l {
            Lang::Ru => Language::Ru,
            Lang::En => Language::En,
        }
    }
}

static CURRENT_LANG: AtomicU8 = AtomicU8::new(0); // 0=Ru (default)

pub fn lang() -> Lang {
    match CURRENT_LANG.load(Ordering::Relaxed) {
        1 => Lang::En,
        _ => Lang::Ru,
    }
}

pub fn set_lang(l: Lang) {
    CURRENT_LANG.store(
        match l {
            Lang::Ru => 0,
            Lang::En => 1,
        },
        Ordering::Relaxed,
    );
}

/// Translate a key to the current language.
pub fn t(key: &str) -> &'static str {
    let ru = lang() == Lang::Ru;
    match key {
        // ── Main menus ──────────────────────────────────────
        "menu.file" => if ru { "Файл" } else { "File" },
        "menu.open" => if ru { "Открыть упражнение..." } else { "Open Exercise..." },
        "menu.open_title" => if ru { "Открыть JSON упражнения" } else { "Open Exercise JSON" },
        "menu.save_answers" => if ru { "Сохранить ответы..." } else { "Save Answers..." },
        "menu.save_answers_title" => if ru { "Сохранить ответы в JSON" } else { "Save Answers JSON" },
        "menu.quit" => if ru { "Выход" } else { "Quit" },

        "menu.exercise" => if ru { "Упражнение" } else { "Exercise" },
        "menu.reset" => if ru { "Сбросить ответы  Ctrl+R" } else { "Reset answers  Ctrl+R" },
        "menu.check" => if ru { "Проверить  Ctrl+Enter" } else { "Check  Ctrl+Enter" },
        "menu.reload_image" => if ru { "Перезагрузить изображение" } else { "Reload image" },

        "menu.view" => if ru { "Вид" } else { "View" },
        "menu.word_bank" => if ru { "Банк слов" } else { "Word bank" },
        "menu.recenter" => if ru { "Центрировать  F" } else { "Recenter  F" },
        "menu.outlines" => if ru { "Контуры зон" } else { "Zone outlines" },
        "menu.language" => if ru { "Язык" } else { "Language" },

        "menu.settings" => if ru { "Настройки" } else { "Settings" },
        "menu.preferences" => if ru { "Параметры..." } else { "Preferences..." },

        // ── Word bank ───────────────────────────────────────
        "bank.title" => if ru { "Слова" } else { "Words" },
        "bank.unplaced" => if ru { "Не размещены" } else { "Unplaced" },
        "bank.placed" => if ru { "Размещены" } else { "Placed" },
        "bank.empty" => if ru { "Все слова размещены" } else { "All words placed" },
        "bank.drop_hint" => if ru { "Перетащите сюда, чтобы убрать" } else { "Drop here to take back" },
        "bank.remove" => if ru { "Убрать" } else { "Remove" },
        "bank.block" => if ru { "блок" } else { "block" },
        "bank.check" => if ru { "Проверить" } else { "Check" },
        "bank.no_exercise" => if ru { "Упражнение не загружено" } else { "No exercise loaded" },

        // ── Viewport ────────────────────────────────────────
        "viewport.loading" => if ru { "Загрузка изображения..." } else { "Loading image..." },
        "viewport.image_unavailable" => if ru { "Изображение недоступно" } else { "Image unavailable" },

        // ── Status bar ──────────────────────────────────────
        "status.placed" => if ru { "Размещено" } else { "Placed" },
        "status.correct" => if ru { "Верно" } else { "Correct" },
        "status.image" => if ru { "Изображение" } else { "Image" },
        "status.image_idle" => if ru { "нет" } else { "none" },
        "status.image_pending" => if ru { "загрузка" } else { "loading" },
        "status.image_ready" => if ru { "готово" } else { "ready" },
        "status.image_unavailable" => if ru { "недоступно" } else { "unavailable" },
        "status.pass" => if ru { "Проход" } else { "Pass" },
        "status.warnings" => if ru { "Предупреждения" } else { "Warnings" },
        "status.complete" => if ru { "Готово к проверке" } else { "Ready to check" },

        // ── Notices ─────────────────────────────────────────
        "notice.saved" => if ru { "Ответы сохранены" } else { "Answers saved" },
        "notice.load_failed" => if ru { "Не удалось открыть упражнение" } else { "Could not open exercise" },
        "notice.save_failed" => if ru { "Не удалось сохранить ответы" } else { "Could not save answers" },
        "notice.incomplete" => if ru { "Разместите все слова" } else { "Place every word first" },
        "notice.result" => if ru { "Результат" } else { "Result" },

        // ── Settings window ─────────────────────────────────
        "settings.title" => if ru { "Настройки" } else { "Settings" },
        "settings.engine" => if ru { "Подгонка" } else { "Fitting" },
        "settings.resize_debounce" => if ru { "Задержка ресайза" } else { "Resize debounce" },
        "settings.image_timeout" => if ru { "Таймаут изображения" } else { "Image timeout" },
        "settings.resize_mode" => if ru { "Режим при ресайзе" } else { "Resize mode" },
        "settings.mode_contain" => if ru { "Вписать с отступом" } else { "Contain with margin" },
        "settings.mode_no_upscale" => if ru { "Без увеличения, по центру" } else { "No upscale, centered" },
        "settings.ui" => if ru { "Интерфейс" } else { "Interface" },
        "settings.font_size" => if ru { "Размер шрифта" } else { "Font size" },

        "settings.apply" => if ru { "Применить" } else { "Apply" },
        "settings.reset" => if ru { "Сбросить" } else { "Reset" },
        "settings.close" => if ru { "Закрыть" } else { "Close" },

        // ── Fallback ────────────────────────────────────────
        _ => "???",
    }
}
