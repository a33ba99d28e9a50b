/// Minimal catalog schema with the tables and view the indexer reads and writes.
pub const CATALOG_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS channel_chattype (
	id serial PRIMARY KEY,
	channel_id integer NOT NULL
);
CREATE TABLE IF NOT EXISTS faq (
	id integer PRIMARY KEY,
	channel_id integer NOT NULL,
	topic text,
	question text,
	answer text
);
CREATE TABLE IF NOT EXISTS services (
	id integer PRIMARY KEY,
	channel_id integer NOT NULL,
	services_name text,
	description text,
	indications text,
	contraindications text,
	pre_session_instructions text,
	body_parts text
);
CREATE TABLE IF NOT EXISTS products (
	id integer PRIMARY KEY,
	channel_id integer NOT NULL,
	article text NOT NULL,
	product_full_name text,
	product_type text,
	body_parts text,
	indications_key text,
	contraindications_key text,
	duration integer,
	price_min numeric,
	price_max numeric,
	CONSTRAINT products_article_key UNIQUE (article)
);
CREATE TABLE IF NOT EXISTS products_services (
	article_id text NOT NULL,
	service_id integer NOT NULL,
	PRIMARY KEY (article_id, service_id)
);
CREATE OR REPLACE VIEW product_service_view AS
SELECT
	p.id,
	p.channel_id,
	concat_ws(' ', p.product_full_name, p.product_type, p.body_parts) AS product_search,
	p.article AS product_id,
	p.product_full_name AS product_name,
	p.product_type,
	p.body_parts,
	p.indications_key,
	p.contraindications_key,
	p.duration,
	p.price_min,
	p.price_max
FROM products p
";
