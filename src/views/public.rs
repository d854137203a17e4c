use crate::middleware::Flash;
use crate::views::{flash_list, html_escape, layout};

pub fn home_page(site_title: &str, year: i32, flashes: &[Flash]) -> String {
    let title = html_escape(site_title);
    let content = format!(
        r##"<header class="site-header">
    <nav class="container">
        <a class="brand" href="/">{title}</a>
        <ul class="nav-links">
            <li><a href="#about">About</a></li>
            <li><a href="#projects">Projects</a></li>
            <li><a href="#contact">Contact</a></li>
        </ul>
    </nav>
</header>

<main>
    <section class="hero container">
        <h1>{title}</h1>
        <p class="lead">Software developer building reliable web services and tools.</p>
        <a class="button" href="#contact">Get in touch</a>
    </section>

    <section id="about" class="container">
        <h2>About</h2>
        <p>I design and build backend systems, data pipelines and the small tools that keep them running.</p>
    </section>

    <section id="projects" class="container">
        <h2>Projects</h2>
        <div class="cards">
            <article class="card"><h3>Web services</h3><p>APIs and server-rendered sites backed by relational storage.</p></article>
            <article class="card"><h3>Automation</h3><p>Command-line tools and scheduled jobs for everyday operations.</p></article>
            <article class="card"><h3>Reporting</h3><p>Exports and printable reports generated straight from the data.</p></article>
        </div>
    </section>

    <section id="contact" class="container">
        <h2>Contact</h2>
        {flashes}
        <form class="contact-form" method="post" action="/contact">
            <label for="name">Name</label>
            <input id="name" name="name" type="text" required>
            <label for="email">Email</label>
            <input id="email" name="email" type="email" required>
            <label for="message">Message</label>
            <textarea id="message" name="message" rows="5" required></textarea>
            <button type="submit" class="button">Send message</button>
        </form>
    </section>
</main>

<footer class="site-footer container">
    <p>&copy; {year} {title}</p>
</footer>"##,
        title = title,
        flashes = flash_list(flashes),
        year = year,
    );
    layout(site_title, "home", &content)
}
