diesel::table! {
    schedules (id) {
        id -> Integer,
        name -> Text,
        is_active -> Bool,
        theme_mode -> Text,
        auto_post -> Bool,
        created_at -> BigInt,
    }
}

diesel::table! {
    schedule_times (id) {
        id -> Integer,
        schedule_id -> Integer,
        time_of_day -> Text,
        days_of_week -> Text,
    }
}

diesel::table! {
    schedule_themes (id) {
        id -> Integer,
        schedule_id -> Integer,
        theme -> Text,
        use_order -> Integer,
    }
}

diesel::table! {
    posts (id) {
        id -> Integer,
        theme -> Text,
        caption -> Text,
        image_url -> Text,
        scheduled_time -> Nullable<Text>,
        status -> Text,
        created_at -> BigInt,
        schedule_id -> Nullable<Integer>,
    }
}

diesel::table! {
    pending_posts (id) {
        id -> Integer,
        schedule_id -> Nullable<Integer>,
        theme -> Text,
        caption -> Text,
        image_url -> Text,
        scheduled_for -> Text,
        status -> Text,
        created_at -> BigInt,
    }
}

diesel::joinable!(schedule_times -> schedules (schedule_id));
diesel::joinable!(schedule_themes -> schedules (schedule_id));
diesel::joinable!(pending_posts -> schedules (schedule_id));

diesel::allow_tables_to_appear_in_same_query!(
    schedules,
    schedule_times,
    schedule_themes,
    posts,
    pending_posts,
);
