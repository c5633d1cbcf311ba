pub mod transcript_view;
