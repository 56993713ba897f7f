// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod catalog;
pub mod reading_list;
pub mod user;

pub use catalog::{Author, AuthorDetail, AuthorWrite, BookDetail, BookWrite, Genre};
pub use reading_list::{ReadingListDetail, ReadingListWrite};
pub use user::{NewUser, User};
