// src/bin/seed.rs
// Loads demo partners and listings into the read model tables.
// Usage: cargo run --bin seed

use anyhow::{Context, Result};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Instant;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

struct SeedPartner {
    id: &'static str,
    user_id: &'static str,
    company_name: &'static str,
    location: &'static str,
    contact_email: &'static str,
    approval_status: &'static str,
}

struct SeedListing {
    id: &'static str,
    partner_id: &'static str,
    title: &'static str,
    description: &'static str,
    location: &'static str,
    category: &'static str,
    price: f64,
    capacity: i32,
    status: &'static str,
    available: bool,
}

fn partners() -> Vec<SeedPartner> {
    vec![
        SeedPartner {
            id: "ptn_hill_stays",
            user_id: "usr_nimal",
            company_name: "Hill Country Stays",
            location: "Ella",
            contact_email: "bookings@hillstays.lk",
            approval_status: "approved",
        },
        SeedPartner {
            id: "ptn_coast_tours",
            user_id: "usr_dilini",
            company_name: "Southern Coast Tours",
            location: "Galle",
            contact_email: "hello@coasttours.lk",
            approval_status: "approved",
        },
        SeedPartner {
            id: "ptn_new_safari",
            user_id: "usr_kasun",
            company_name: "Yala Safari Co",
            location: "Tissamaharama",
            contact_email: "info@yalasafari.lk",
            approval_status: "pending",
        },
    ]
}

fn listings() -> Vec<SeedListing> {
    vec![
        SeedListing {
            id: "lst_ella_cabin",
            partner_id: "ptn_hill_stays",
            title: "Ella Rock Cabin",
            description: "Two-room cabin facing Ella Rock, breakfast included",
            location: "Ella",
            category: "hotel",
            price: 85.0,
            capacity: 3,
            status: "approved",
            available: true,
        },
        SeedListing {
            id: "lst_tea_bungalow",
            partner_id: "ptn_hill_stays",
            title: "Tea Estate Bungalow",
            description: "Colonial bungalow inside a working tea estate",
            location: "Haputale",
            category: "hotel",
            price: 140.0,
            capacity: 6,
            status: "approved",
            available: true,
        },
        SeedListing {
            id: "lst_galle_fort_walk",
            partner_id: "ptn_coast_tours",
            title: "Galle Fort Heritage Walk",
            description: "Guided half-day walk through the fort",
            location: "Galle",
            category: "tour",
            price: 25.0,
            capacity: 12,
            status: "approved",
            available: true,
        },
        SeedListing {
            id: "lst_whale_watch",
            partner_id: "ptn_coast_tours",
            title: "Mirissa Whale Watching",
            description: "Morning boat trip, seasonal",
            location: "Mirissa",
            category: "tour",
            price: 60.0,
            capacity: 20,
            status: "inactive",
            available: false,
        },
        SeedListing {
            id: "lst_yala_jeep",
            partner_id: "ptn_new_safari",
            title: "Yala Jeep Safari",
            description: "Full-day jeep safari with tracker",
            location: "Yala",
            category: "tour",
            price: 110.0,
            capacity: 6,
            status: "pending",
            available: true,
        },
    ]
}

async fn seed_partners(pool: &PgPool) -> Result<u64> {
    let mut written = 0;
    for p in partners() {
        let result = sqlx::query(
            r#"
            INSERT INTO partners (id, user_id, company_name, location, contact_email, approval_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                location = EXCLUDED.location,
                contact_email = EXCLUDED.contact_email,
                approval_status = EXCLUDED.approval_status,
                updated_at = NOW()
            "#,
        )
        .bind(p.id)
        .bind(p.user_id)
        .bind(p.company_name)
        .bind(p.location)
        .bind(p.contact_email)
        .bind(p.approval_status)
        .execute(pool)
        .await
        .with_context(|| format!("inserting partner {}", p.id))?;

        written += result.rows_affected();
        println!("  {}+{} partner {} ({})", GREEN, RESET, p.company_name, p.approval_status);
    }
    Ok(written)
}

async fn seed_listings(pool: &PgPool) -> Result<u64> {
    let mut written = 0;
    for l in listings() {
        let result = sqlx::query(
            r#"
            INSERT INTO listings
                (id, partner_id, title, description, location, category, price, capacity, status, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                location = EXCLUDED.location,
                category = EXCLUDED.category,
                price = EXCLUDED.price,
                capacity = EXCLUDED.capacity,
                status = EXCLUDED.status,
                available = EXCLUDED.available,
                updated_at = NOW()
            "#,
        )
        .bind(l.id)
        .bind(l.partner_id)
        .bind(l.title)
        .bind(l.description)
        .bind(l.location)
        .bind(l.category)
        .bind(l.price)
        .bind(l.capacity)
        .bind(l.status)
        .bind(l.available)
        .execute(pool)
        .await
        .with_context(|| format!("inserting listing {}", l.id))?;

        written += result.rows_affected();
        println!(
            "  {}+{} listing {} @ {:.2} ({})",
            GREEN, RESET, l.title, l.price, l.status
        );
    }
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let started = Instant::now();

    println!("{}{}SkyConnect demo data{}", BOLD, CYAN, RESET);

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("connecting to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    println!("\n{}Partners{}", BOLD, RESET);
    let partner_rows = seed_partners(&pool).await?;

    println!("\n{}Listings{}", BOLD, RESET);
    let listing_rows = seed_listings(&pool).await?;

    println!(
        "\n{}Done:{} {} partner row(s), {} listing row(s) in {:.1}s",
        YELLOW,
        RESET,
        partner_rows,
        listing_rows,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
