// Data models for pose landmarks, exercises and training sessions

pub mod exercise;
pub mod pose;
