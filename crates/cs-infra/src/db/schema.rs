diesel::table! {
    t_clipboard_record (id) {
        id -> Text,
        content -> Text,
        content_kind -> Text,
        blob_key -> Nullable<Text>,
        thumbnail_key -> Nullable<Text>,
        content_hash -> BigInt,
        created_at_ms -> BigInt,
        usage_count -> BigInt,
        last_used_at_ms -> Nullable<BigInt>,
        recommendation_score -> Double,
        recommended_at_ms -> Nullable<BigInt>,
        evicted_at_ms -> Nullable<BigInt>,
        note -> Nullable<Text>,
        tags -> Text,
    }
}
