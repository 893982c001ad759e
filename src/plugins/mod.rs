// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod error_pages;
pub mod mail_injection;

pub use error_pages::ErrorPages;
pub use mail_injection::MailInjection;
