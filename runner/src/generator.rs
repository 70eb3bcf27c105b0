mod words;

use crate::{
    database::{ConnectionAdapters, ConnectionError, Customer, Order, Status},
    schema,
};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, instrument};
use words::{
    CITIES, EMAIL_DOMAINS, FIRST_NAMES, LAST_NAMES, NEIGHBORHOODS, STREET_NAMES, STREET_TYPES,
    WORDS,
};

/// upper bound of an order description in characters
pub const DESCRIPTION_LENGTH: usize = 200;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to store synthetic data: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Cannot generate {0} orders without any customer to reference")]
    NoCustomers(u64),
    #[error("Expected {expected} rows in {table}, found {found}")]
    Incomplete {
        table: &'static str,
        expected: u64,
        found: u64,
    },
}

/// Produces pt_BR flavoured customers and orders.
///
/// With a seed the sequence of records is reproducible, order dates are
/// relative to the clock captured on construction.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
    now: NaiveDateTime,
    sequence: u64,
}

impl Generator {
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_clock(seed, Local::now().naive_local())
    }

    pub fn with_clock(seed: Option<u64>, now: NaiveDateTime) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            // datetime columns have second precision
            now: now.with_nanosecond(0).unwrap_or(now),
            sequence: 0,
        }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words[self.rng.gen_range(0..words.len())]
    }

    pub fn customer(&mut self) -> Customer {
        self.sequence += 1;

        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let domain = self.pick(EMAIL_DOMAINS);
        let email = format!(
            "{}.{}{}@{domain}",
            ascii(first),
            ascii(last),
            self.sequence
        );

        let age_days = self.rng.gen_range(18 * 365..=80 * 365);
        let birth_date = self.now.date() - Duration::days(age_days);

        Customer {
            name: format!("{first} {last}"),
            email,
            birth_date,
            address: self.address(),
        }
    }

    fn address(&mut self) -> String {
        let street_type = self.pick(STREET_TYPES);
        let street = self.pick(STREET_NAMES);
        let number = self.rng.gen_range(1..=9999);
        let neighborhood = self.pick(NEIGHBORHOODS);
        let (city, state) = CITIES[self.rng.gen_range(0..CITIES.len())];
        let cep = format!(
            "{:05}-{:03}",
            self.rng.gen_range(1_000..100_000),
            self.rng.gen_range(0..1_000)
        );

        format!("{street_type} {street}, {number}\n{neighborhood}\n{cep} {city} / {state}")
    }

    /// None if there is no customer to reference
    pub fn order(&mut self, customer_ids: &[i64]) -> Option<Order> {
        let customer_id = *customer_ids.choose(&mut self.rng)?;
        let total = self.rng.gen_range(1_000..=100_000) as f64 / 100.0;
        let description = self.text(DESCRIPTION_LENGTH);

        let start = NaiveDate::from_ymd_opt(self.now.year(), 1, 1)?.and_hms_opt(0, 0, 0)?;
        let span = (self.now - start).num_seconds().max(0);
        let order_date = start + Duration::seconds(self.rng.gen_range(0..=span));

        let status = *Status::ALL.choose(&mut self.rng)?;

        Some(Order {
            customer_id,
            total,
            description,
            order_date,
            status,
        })
    }

    fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(4..=10);
        let sentence = (0..count).map(|_| self.pick(WORDS)).join(" ");

        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
            None => sentence,
        }
    }

    /// whole sentences up to `max_chars`
    fn text(&mut self, max_chars: usize) -> String {
        let mut text = String::new();

        loop {
            let sentence = self.sentence();
            let separator = usize::from(!text.is_empty());

            if text.chars().count() + separator + sentence.chars().count() > max_chars {
                if text.is_empty() {
                    text = sentence.chars().take(max_chars).collect();
                }

                return text;
            }

            if separator == 1 {
                text.push(' ');
            }
            text.push_str(&sentence);
        }
    }
}

fn ascii(word: &str) -> String {
    word.chars()
        .map(|char| match char {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            'Á' | 'Â' | 'Ã' => 'a',
            'É' => 'e',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Replace all rows with `customers` new customers and `orders` new orders,
/// inserted in batches of `batch_size` rows per transaction.
#[instrument(skip(connection, generator), level = "info")]
pub fn populate(
    connection: &mut ConnectionAdapters,
    generator: &mut Generator,
    customers: u64,
    orders: u64,
    batch_size: u64,
) -> Result<(), GenerateError> {
    if orders > 0 && customers == 0 {
        return Err(GenerateError::NoCustomers(orders));
    }

    schema::clear(connection)?;

    let batch_size = batch_size.max(1);
    let mut inserted = 0;
    while inserted < customers {
        let size = batch_size.min(customers - inserted);
        let batch = (0..size).map(|_| generator.customer()).collect_vec();
        connection.insert_customers(&batch)?;

        inserted += size;
        info!("Inserted {inserted} of {customers} customers");
    }

    let customer_ids = connection.customer_ids()?;
    if orders > 0 && customer_ids.is_empty() {
        return Err(GenerateError::NoCustomers(orders));
    }

    let mut inserted = 0;
    while inserted < orders {
        let size = batch_size.min(orders - inserted);
        let batch = (0..size)
            .filter_map(|_| generator.order(&customer_ids))
            .collect_vec();
        connection.insert_orders(&batch)?;

        inserted += size;
        info!("Inserted {inserted} of {orders} orders");
    }

    for (table, expected) in [("customers", customers), ("orders", orders)] {
        let found = connection.count(table)?;
        if found != expected {
            return Err(GenerateError::Incomplete {
                table,
                expected,
                found,
            });
        }
    }

    info!(customers, orders, "Data set is ready");

    Ok(())
}
