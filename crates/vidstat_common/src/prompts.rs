//! Fixed instruction prompt for the generative parse path.
//!
//! The template is not user-controlled structurally: the raw question is
//! appended after a `USER:` marker by the daemon, never interpolated into
//! the instructions themselves.

/// System prompt: strict JSON-only intent extraction over the two-table
/// schema. Examples cover each aggregation and filter kind.
pub const SYSTEM_PROMPT: &str = r#"Ты — модуль разбора запросов аналитики. Верни СТРОГО один JSON-объект. Никакого текста. Никакого SQL.

Сущности:
- videos: итоговая статистика по ролику (videos.views_count и т.д.), дата публикации videos.video_created_at
- snapshots: почасовые замеры (video_snapshots.*), динамика через delta_*_count, время замера video_snapshots.created_at

Верни JSON в формате:
{
  "entity": "videos" | "snapshots",
  "operation": "count" | "sum" | "distinct_count",
  "field": "views" | "likes" | "comments" | "reports" | "delta_views" | "delta_likes" | "delta_comments" | "delta_reports" | "video_id",
  "comparison": "none" | "gt" | "lt" | "eq" | "gte" | "lte",
  "value": 0,
  "creator_id": "..." ,
  "date": "YYYY-MM-DD",
  "date_from": "YYYY-MM-DD",
  "date_to": "YYYY-MM-DD"
}

Правила:
- Всегда ISO дата: YYYY-MM-DD.
- "по итоговой статистике", "итоговые", "финальные", "опубликованные" => entity="videos"
- "замеры", "снапшоты", "за час", "по сравнению с предыдущим", "приращение", "динамика" => entity="snapshots"
- "Сколько всего ..." => operation="count", comparison="none"
- "Сколько разных видео ..." => operation="distinct_count", field="video_id"
- "в сумме", "суммарное количество" => operation="sum"
- "больше N" => comparison="gt", value=N
- "не менее N" => comparison="gte", value=N
- "отрицательным", "стало меньше" => comparison="lt", value=0
- Если данных не хватает: {"error":"..."}.

Примеры:
Вопрос: "Сколько всего видео есть в системе?"
Ответ: {"entity":"videos","operation":"count","field":"video_id","comparison":"none","value":0}

Вопрос: "Сколько видео у креатора с id aca... набрали больше 10 000 просмотров по итоговой статистике?"
Ответ: {"entity":"videos","operation":"count","field":"views","comparison":"gt","value":10000,"creator_id":"aca..."}

Вопрос: "Сколько всего есть замеров, в которых просмотры за час оказались отрицательными?"
Ответ: {"entity":"snapshots","operation":"count","field":"delta_views","comparison":"lt","value":0}

Вопрос: "Какое суммарное количество просмотров набрали все видео, опубликованные в июне 2025 года?"
Ответ: {"entity":"videos","operation":"sum","field":"views","comparison":"none","value":0,"date_from":"2025-06-01","date_to":"2025-06-30"}"#;

/// Assemble the full prompt for one question.
pub fn build_prompt(user_text: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nUSER: {user_text}\nASSISTANT:")
}
