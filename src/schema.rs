// Diesel table definitions.
// Kept in sync by hand with the DDL in repository/context.rs.

diesel::table! {
    sites (site_id) {
        site_id -> Integer,
        site_name -> Text,
        site_url -> Text,
        site_code -> Text,
        fetch_type -> Text,
        api_url -> Nullable<Text>,
        description -> Nullable<Text>,
        active -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    ranking_types (ranking_type_id) {
        ranking_type_id -> Integer,
        site_id -> Integer,
        type_name -> Text,
        type_code -> Text,
        type_url -> Nullable<Text>,
        description -> Nullable<Text>,
        active -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    rankings (ranking_id) {
        ranking_id -> Integer,
        site_id -> Integer,
        ranking_type_id -> Integer,
        fetch_date -> Text,
        book_id -> Nullable<Text>,
        rank -> Integer,
        title -> Text,
        author -> Nullable<Text>,
        book_url -> Nullable<Text>,
        category -> Nullable<Text>,
        indicator_value -> Nullable<Text>,
        indicator_unit -> Nullable<Text>,
        cover_url -> Nullable<Text>,
        latest_chapter -> Nullable<Text>,
        creation_status -> Nullable<Integer>,
        extra_data -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    fetch_logs (log_id) {
        log_id -> Integer,
        site_id -> Integer,
        fetch_time -> Text,
        status -> Text,
        message -> Nullable<Text>,
        items_fetched -> Integer,
    }
}

diesel::joinable!(ranking_types -> sites (site_id));
diesel::joinable!(rankings -> ranking_types (ranking_type_id));
diesel::joinable!(fetch_logs -> sites (site_id));

diesel::allow_tables_to_appear_in_same_query!(sites, ranking_types, rankings, fetch_logs,);
