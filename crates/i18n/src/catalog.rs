use std::collections::HashMap;

use crate::Language;

/// Message templates keyed by language and `category.key`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<Language, HashMap<String, String>>,
}

impl Catalog {
    /// The catalog shipped with the bot.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (lang, table) in [(Language::Ru, RU), (Language::En, EN), (Language::Uz, UZ)] {
            for (id, text) in table {
                let entry = catalog.entries.entry(lang).or_default();
                entry.insert((*id).to_string(), (*text).to_string());
            }
        }
        catalog
    }

    pub fn insert(
        &mut self,
        language: Language,
        category: &str,
        key: &str,
        text: impl Into<String>,
    ) {
        self.entries
            .entry(language)
            .or_default()
            .insert(format!("{category}.{key}"), text.into());
    }

    #[must_use]
    pub fn get(&self, language: Language, category: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&language)?
            .get(&format!("{category}.{key}"))
            .map(String::as_str)
    }
}

const RU: &[(&str, &str)] = &[
    ("start.greeting", "👋 Привет, {name}!\n\nЯ обрабатываю видео: конвертирую в другие форматы, сжимаю, извлекаю звук и обрезаю.\n\nОтправьте видео или ссылку на него, чтобы начать. Список команд: /help."),
    ("help.title", "📋 Команды"),
    ("help.usage_title", "📝 Как пользоваться"),
    ("help.usage_steps", "1. Отправьте видео или ссылку на видео\n2. Выберите действие\n3. Следуйте подсказкам"),
    ("help.limits_title", "⚠️ Ограничения"),
    ("help.max_file_size", "• Максимальный размер файла: {max_file_size} МБ"),
    ("help.max_requests", "• Запросов в минуту: не более {max_requests}"),
    ("commands.start", "Начать работу с ботом"),
    ("commands.help", "Показать справку"),
    ("commands.cancel", "Отменить текущую операцию"),
    ("commands.settings", "Настройки"),
    ("prompt.operation", "🎬 Что сделать с видео?"),
    ("prompt.format", "🔄 Выберите формат:"),
    ("prompt.quality", "🗜️ Выберите качество сжатия:"),
    ("prompt.audio_format", "🔊 Выберите формат аудио:"),
    ("prompt.bitrate", "🔊 Выберите битрейт:"),
    ("prompt.trim_start", "✂️ Введите время начала (секунды, MM:SS или H:MM:SS):"),
    ("prompt.trim_end", "✂️ Введите время конца или выберите вариант:"),
    ("button.convert", "🔄 Конвертировать"),
    ("button.compress", "🗜️ Сжать"),
    ("button.extract_audio", "🔊 Извлечь аудио"),
    ("button.trim", "✂️ Обрезать"),
    ("button.back", "⬅️ Назад"),
    ("button.cancel", "❌ Отмена"),
    ("button.quality_high", "Высокое качество"),
    ("button.quality_medium", "Среднее качество"),
    ("button.quality_low", "Низкое качество"),
    ("button.bitrate_320k", "Высокий (320k)"),
    ("button.bitrate_192k", "Средний (192k)"),
    ("button.bitrate_128k", "Низкий (128k)"),
    ("button.end_of_video", "Конец видео"),
    ("button.plus_10s", "+10 сек"),
    ("button.plus_30s", "+30 сек"),
    ("button.plus_1m", "+1 мин"),
    ("button.plus_2m", "+2 мин"),
    ("button.plus_5m", "+5 мин"),
    ("button.plus_10m", "+10 мин"),
    ("status.receiving", "⏳ Получаю видео..."),
    ("status.downloading", "⏳ Загружаю видео по ссылке..."),
    ("status.processing", "⏳ Обрабатываю видео..."),
    ("status.done", "✅ Готово! Результат {operation} отправлен."),
    ("status.cancelled", "✅ Операция отменена. Можно начать заново."),
    ("status.nothing_to_cancel", "❌ Нет активной операции для отмены."),
    ("status.busy", "⏳ Предыдущая операция ещё не завершена. Отправьте /cancel, чтобы начать заново."),
    ("status.send_source", "Отправьте видео или ссылку на видео."),
    ("error.quota_exceeded", "⚠️ Превышен лимит запросов. Попробуйте позже."),
    ("error.too_large", "❌ Файл слишком большой. Максимум {max_file_size} МБ."),
    ("error.unsupported_url", "❌ Ссылка не поддерживается. Отправьте ссылку на видео с известного сервиса."),
    ("error.unreachable", "❌ Не удалось получить видео. Проверьте ссылку или попробуйте другое видео."),
    ("error.encode_failed", "❌ Не удалось обработать видео: {error}"),
    ("error.delivery_failed", "❌ Видео обработано, но отправить результат не удалось. Попробуйте ещё раз."),
    ("error.invalid_time", "❌ Неверный формат времени. Укажите секунды, MM:SS или H:MM:SS:"),
    ("error.negative_time", "❌ Время должно быть неотрицательным. Попробуйте снова:"),
    ("error.end_before_start", "❌ Время конца должно быть больше времени начала ({start}). Попробуйте снова:"),
    ("error.insufficient_data", "❌ Недостаточно данных для обработки видео."),
    ("error.unexpected_input", "Выберите вариант с помощью кнопок или отправьте /cancel."),
    ("quality.high", "высоким"),
    ("quality.medium", "средним"),
    ("quality.low", "низким"),
    ("describe.convert", "конвертации в {format}"),
    ("describe.compress", "сжатия с {quality} качеством"),
    ("describe.extract_audio", "извлечения аудио в {format} с битрейтом {bitrate}"),
    ("describe.trim_range", "обрезки (с {start} до {end} сек)"),
    ("describe.trim_to_end", "обрезки (с {start} сек до конца)"),
    ("caption.video", "Видео после {operation}"),
    ("caption.audio", "Аудио извлечено из видео ({format}, {bitrate})"),
    ("settings.title", "⚙️ Настройки"),
    ("settings.language", "🌐 Язык: {language}"),
    ("settings.choose", "🌐 Выберите язык:"),
    ("settings.changed", "✅ Язык изменён на русский."),
];

const EN: &[(&str, &str)] = &[
    ("start.greeting", "👋 Hello, {name}!\n\nI process videos: convert them to other formats, compress them, extract audio and trim them.\n\nSend me a video or a link to one to get started. Commands: /help."),
    ("help.title", "📋 Commands"),
    ("help.usage_title", "📝 How to use"),
    ("help.usage_steps", "1. Send a video or a link to a video\n2. Choose an action\n3. Follow the prompts"),
    ("help.limits_title", "⚠️ Limits"),
    ("help.max_file_size", "• Maximum file size: {max_file_size} MB"),
    ("help.max_requests", "• Requests per minute: at most {max_requests}"),
    ("commands.start", "Start working with the bot"),
    ("commands.help", "Show help"),
    ("commands.cancel", "Cancel the current operation"),
    ("commands.settings", "Settings"),
    ("prompt.operation", "🎬 What should I do with the video?"),
    ("prompt.format", "🔄 Choose a format:"),
    ("prompt.quality", "🗜️ Choose compression quality:"),
    ("prompt.audio_format", "🔊 Choose an audio format:"),
    ("prompt.bitrate", "🔊 Choose a bitrate:"),
    ("prompt.trim_start", "✂️ Enter the start time (seconds, MM:SS or H:MM:SS):"),
    ("prompt.trim_end", "✂️ Enter the end time or pick an option:"),
    ("button.convert", "🔄 Convert"),
    ("button.compress", "🗜️ Compress"),
    ("button.extract_audio", "🔊 Extract audio"),
    ("button.trim", "✂️ Trim"),
    ("button.back", "⬅️ Back"),
    ("button.cancel", "❌ Cancel"),
    ("button.quality_high", "High quality"),
    ("button.quality_medium", "Medium quality"),
    ("button.quality_low", "Low quality"),
    ("button.bitrate_320k", "High (320k)"),
    ("button.bitrate_192k", "Medium (192k)"),
    ("button.bitrate_128k", "Low (128k)"),
    ("button.end_of_video", "End of video"),
    ("button.plus_10s", "+10 sec"),
    ("button.plus_30s", "+30 sec"),
    ("button.plus_1m", "+1 min"),
    ("button.plus_2m", "+2 min"),
    ("button.plus_5m", "+5 min"),
    ("button.plus_10m", "+10 min"),
    ("status.receiving", "⏳ Receiving video..."),
    ("status.downloading", "⏳ Downloading video from link..."),
    ("status.processing", "⏳ Processing video..."),
    ("status.done", "✅ Done! Result of {operation} sent."),
    ("status.cancelled", "✅ Operation cancelled. You can start again."),
    ("status.nothing_to_cancel", "❌ No active operation to cancel."),
    ("status.busy", "⏳ Your previous request is still in progress. Send /cancel to start over."),
    ("status.send_source", "Send a video or a link to a video."),
    ("error.quota_exceeded", "⚠️ Rate limit exceeded. Please try again later."),
    ("error.too_large", "❌ The file is too large. The limit is {max_file_size} MB."),
    ("error.unsupported_url", "❌ This link is not supported. Send a link to a video on a known hosting site."),
    ("error.unreachable", "❌ Could not fetch the video. Check the link or try another video."),
    ("error.encode_failed", "❌ Could not process the video: {error}"),
    ("error.delivery_failed", "❌ The video was processed but the result could not be sent. Please try again."),
    ("error.invalid_time", "❌ Invalid time format. Use seconds, MM:SS or H:MM:SS:"),
    ("error.negative_time", "❌ Time must not be negative. Please try again:"),
    ("error.end_before_start", "❌ End time must be greater than start time ({start}). Please try again:"),
    ("error.insufficient_data", "❌ Insufficient data to process the video."),
    ("error.unexpected_input", "Pick an option with the buttons or send /cancel."),
    ("quality.high", "high"),
    ("quality.medium", "medium"),
    ("quality.low", "low"),
    ("describe.convert", "conversion to {format}"),
    ("describe.compress", "compression with {quality} quality"),
    ("describe.extract_audio", "audio extraction to {format} at {bitrate}"),
    ("describe.trim_range", "trimming (from {start} to {end} sec)"),
    ("describe.trim_to_end", "trimming (from {start} sec to the end)"),
    ("caption.video", "Video after {operation}"),
    ("caption.audio", "Audio extracted from video ({format}, {bitrate})"),
    ("settings.title", "⚙️ Settings"),
    ("settings.language", "🌐 Language: {language}"),
    ("settings.choose", "🌐 Choose a language:"),
    ("settings.changed", "✅ Language changed to English."),
];

const UZ: &[(&str, &str)] = &[
    ("start.greeting", "👋 Salom, {name}!\n\nMen videolarni qayta ishlayman: boshqa formatga o'zgartiraman, siqaman, audiosini ajrataman va qirqaman.\n\nBoshlash uchun video yoki unga havola yuboring. Buyruqlar: /help."),
    ("help.title", "📋 Buyruqlar"),
    ("help.usage_title", "📝 Qanday foydalanish"),
    ("help.usage_steps", "1. Video yoki videoga havola yuboring\n2. Amalni tanlang\n3. Ko'rsatmalarga amal qiling"),
    ("help.limits_title", "⚠️ Cheklovlar"),
    ("help.max_file_size", "• Maksimal fayl hajmi: {max_file_size} MB"),
    ("help.max_requests", "• Bir daqiqada ko'pi bilan {max_requests} so'rov"),
    ("commands.start", "Bot bilan ishlashni boshlash"),
    ("commands.help", "Yordam ko'rsatish"),
    ("commands.cancel", "Joriy operatsiyani bekor qilish"),
    ("commands.settings", "Sozlamalar"),
    ("prompt.operation", "🎬 Video bilan nima qilay?"),
    ("prompt.format", "🔄 Formatni tanlang:"),
    ("prompt.quality", "🗜️ Siqish sifatini tanlang:"),
    ("prompt.audio_format", "🔊 Audio formatini tanlang:"),
    ("prompt.bitrate", "🔊 Bitreytni tanlang:"),
    ("prompt.trim_start", "✂️ Boshlanish vaqtini kiriting (soniya, MM:SS yoki H:MM:SS):"),
    ("prompt.trim_end", "✂️ Tugash vaqtini kiriting yoki variantni tanlang:"),
    ("button.convert", "🔄 Konvertatsiya"),
    ("button.compress", "🗜️ Siqish"),
    ("button.extract_audio", "🔊 Audio ajratish"),
    ("button.trim", "✂️ Qirqish"),
    ("button.back", "⬅️ Orqaga"),
    ("button.cancel", "❌ Bekor qilish"),
    ("button.quality_high", "Yuqori sifat"),
    ("button.quality_medium", "O'rta sifat"),
    ("button.quality_low", "Past sifat"),
    ("button.bitrate_320k", "Yuqori (320k)"),
    ("button.bitrate_192k", "O'rta (192k)"),
    ("button.bitrate_128k", "Past (128k)"),
    ("button.end_of_video", "Video oxiri"),
    ("button.plus_10s", "+10 soniya"),
    ("button.plus_30s", "+30 soniya"),
    ("button.plus_1m", "+1 daqiqa"),
    ("button.plus_2m", "+2 daqiqa"),
    ("button.plus_5m", "+5 daqiqa"),
    ("button.plus_10m", "+10 daqiqa"),
    ("status.receiving", "⏳ Video qabul qilinmoqda..."),
    ("status.downloading", "⏳ Havoladan video yuklab olinmoqda..."),
    ("status.processing", "⏳ Video qayta ishlanmoqda..."),
    ("status.done", "✅ Tayyor! {operation} natijasi yuborildi."),
    ("status.cancelled", "✅ Operatsiya bekor qilindi. Qaytadan boshlashingiz mumkin."),
    ("status.nothing_to_cancel", "❌ Bekor qilish uchun faol operatsiya yo'q."),
    ("status.busy", "⏳ Oldingi so'rov hali tugamadi. Qaytadan boshlash uchun /cancel yuboring."),
    ("status.send_source", "Video yoki videoga havola yuboring."),
    ("error.quota_exceeded", "⚠️ So'rovlar soni cheklangan. Keyinroq urinib ko'ring."),
    ("error.too_large", "❌ Fayl juda katta. Chegara {max_file_size} MB."),
    ("error.unsupported_url", "❌ Bu havola qo'llab-quvvatlanmaydi. Ma'lum xizmatdagi videoga havola yuboring."),
    ("error.unreachable", "❌ Videoni olib bo'lmadi. Havolani tekshiring yoki boshqa videoni sinab ko'ring."),
    ("error.encode_failed", "❌ Videoni qayta ishlab bo'lmadi: {error}"),
    ("error.delivery_failed", "❌ Video qayta ishlandi, lekin natijani yuborib bo'lmadi. Qaytadan urinib ko'ring."),
    ("error.invalid_time", "❌ Noto'g'ri vaqt formati. Soniya, MM:SS yoki H:MM:SS kiriting:"),
    ("error.negative_time", "❌ Vaqt manfiy bo'lmasligi kerak. Qayta urinib ko'ring:"),
    ("error.end_before_start", "❌ Tugash vaqti boshlanish vaqtidan ({start}) katta bo'lishi kerak. Qayta urinib ko'ring:"),
    ("error.insufficient_data", "❌ Videoni qayta ishlash uchun ma'lumot yetarli emas."),
    ("error.unexpected_input", "Tugmalar orqali tanlang yoki /cancel yuboring."),
    ("quality.high", "yuqori"),
    ("quality.medium", "o'rta"),
    ("quality.low", "past"),
    ("describe.convert", "{format}ga konvertatsiya"),
    ("describe.compress", "{quality} sifat bilan siqish"),
    ("describe.extract_audio", "{format} formatida {bitrate} bilan audio ajratish"),
    ("describe.trim_range", "qirqish ({start} dan {end} soniyagacha)"),
    ("describe.trim_to_end", "qirqish ({start} soniyadan oxirigacha)"),
    ("caption.video", "Video: {operation}"),
    ("caption.audio", "Videodan ajratilgan audio ({format}, {bitrate})"),
    ("settings.title", "⚙️ Sozlamalar"),
    ("settings.language", "🌐 Til: {language}"),
    ("settings.choose", "🌐 Tilni tanlang:"),
    ("settings.changed", "✅ Til o'zbek tiliga o'zgartirildi."),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_language_has_the_same_keys() {
        let keys = |table: &[(&'static str, &'static str)]| table.iter().map(|(k, _)| *k).collect::<HashSet<_>>();
        assert_eq!(keys(RU), keys(EN));
        assert_eq!(keys(RU), keys(UZ));
    }

    #[test]
    fn no_duplicate_keys() {
        for table in [RU, EN, UZ] {
            let unique: HashSet<_> = table.iter().map(|(k, _)| k).collect();
            assert_eq!(unique.len(), table.len());
        }
    }
}
